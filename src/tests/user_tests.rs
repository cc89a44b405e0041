//! Favorites paging and user-scoped invalidation

#[cfg(test)]
mod tests {
    use crate::{
        models::{ProjectUser, Purchase},
        service::ServiceError,
        tests::support::{setup, snapshot, TestStack, BUYER, CHAIN, OWNER, USDC},
    };
    use std::sync::atomic::Ordering;

    async fn with_projects(ids: &[u64]) -> TestStack {
        let stack = setup().await;
        for id in ids {
            stack.indexer.set_project(snapshot(*id, OWNER, false, 100));
        }
        stack
    }

    fn purchase(n: u64) -> Purchase {
        Purchase {
            tx_hash: format!("0x{:064x}", n),
            project_id: 42,
            payment_method: USDC.to_string(),
            amount: "1000000".to_string(),
            access_duration: 86_400,
            timestamp: 1_700_000_000 + n,
        }
    }

    #[tokio::test]
    async fn test_favorites_paging() {
        let stack = with_projects(&[1, 2, 3]).await;
        for id in [1, 2, 3] {
            assert!(stack.state.users.add_favorite(CHAIN, BUYER, id).await.unwrap());
        }

        let first = stack.state.users.get_favorites(CHAIN, BUYER, Some(1), Some(2)).await.unwrap();
        assert_eq!(first.project_ids, vec![3, 2]);
        assert_eq!(first.total, 3);

        let second = stack.state.users.get_favorites(CHAIN, BUYER, Some(2), Some(2)).await.unwrap();
        assert_eq!(second.project_ids, vec![1]);

        let past_end = stack.state.users.get_favorites(CHAIN, BUYER, Some(3), Some(2)).await.unwrap();
        assert!(past_end.project_ids.is_empty());
        assert_eq!(past_end.total, 3);
        assert_eq!(past_end.page, 3);
    }

    #[tokio::test]
    async fn test_favorites_exact_boundary() {
        let stack = with_projects(&[1, 2, 3, 4]).await;
        for id in [1, 2, 3, 4] {
            stack.state.users.add_favorite(CHAIN, BUYER, id).await.unwrap();
        }

        // count == page * limit
        let last = stack.state.users.get_favorites(CHAIN, BUYER, Some(2), Some(2)).await.unwrap();
        assert_eq!(last.project_ids, vec![2, 1]);

        // count == (page - 1) * limit
        let beyond = stack.state.users.get_favorites(CHAIN, BUYER, Some(3), Some(2)).await.unwrap();
        assert!(beyond.project_ids.is_empty());
    }

    #[tokio::test]
    async fn test_adding_favorite_refreshes_cached_pages() {
        let stack = with_projects(&[1, 2]).await;
        stack.state.users.add_favorite(CHAIN, BUYER, 1).await.unwrap();

        let before = stack.state.users.get_favorites(CHAIN, BUYER, None, None).await.unwrap();
        assert_eq!(before.project_ids, vec![1]);

        stack.state.users.add_favorite(CHAIN, BUYER, 2).await.unwrap();
        let after = stack.state.users.get_favorites(CHAIN, BUYER, None, None).await.unwrap();
        assert_eq!(after.project_ids, vec![2, 1]);
        assert_eq!(after.total, 2);

        stack.state.users.remove_favorite(CHAIN, BUYER, 2).await.unwrap();
        let removed = stack.state.users.get_favorites(CHAIN, BUYER, None, None).await.unwrap();
        assert_eq!(removed.project_ids, vec![1]);
    }

    #[tokio::test]
    async fn test_favorite_changes_are_idempotent() {
        let stack = with_projects(&[1]).await;

        assert!(stack.state.users.add_favorite(CHAIN, BUYER, 1).await.unwrap());
        assert!(!stack.state.users.add_favorite(CHAIN, BUYER, 1).await.unwrap());
        assert!(stack.state.users.remove_favorite(CHAIN, BUYER, 1).await.unwrap());
        assert!(!stack.state.users.remove_favorite(CHAIN, BUYER, 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_favorite_of_unknown_project_rejected() {
        let stack = setup().await;

        let result = stack.state.users.add_favorite(CHAIN, BUYER, 99).await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));

        let page = stack.state.users.get_favorites(CHAIN, BUYER, None, None).await.unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_favorites_addresses_are_case_insensitive() {
        let stack = with_projects(&[1]).await;
        let shouting = BUYER.replace("c3", "C3");

        stack.state.users.add_favorite(CHAIN, &shouting, 1).await.unwrap();
        let page = stack.state.users.get_favorites(CHAIN, BUYER, None, None).await.unwrap();
        assert_eq!(page.project_ids, vec![1]);
    }

    #[tokio::test]
    async fn test_invalid_page_rejected() {
        let stack = setup().await;

        let zero = stack.state.users.get_favorites(CHAIN, BUYER, Some(0), None).await;
        assert!(matches!(zero, Err(ServiceError::InvalidParameter(_))));

        let bad_user = stack.state.users.get_favorites(CHAIN, "0x1234", None, None).await;
        assert!(matches!(bad_user, Err(ServiceError::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn test_purchase_invalidates_buyer_history() {
        let stack = setup().await;
        stack.indexer.set_purchases(vec![purchase(1)]);

        let first = stack.state.users.get_user_purchases(CHAIN, BUYER, None, None).await.unwrap();
        assert_eq!(first.items.len(), 1);
        stack.state.users.get_user_purchases(CHAIN, BUYER, None, None).await.unwrap();
        assert_eq!(stack.indexer.page_calls.load(Ordering::SeqCst), 1);

        stack.indexer.set_purchases(vec![purchase(2), purchase(1)]);
        stack.state.accounting.record_purchase(CHAIN, 42, BUYER).await.unwrap();

        let refreshed = stack.state.users.get_user_purchases(CHAIN, BUYER, None, None).await.unwrap();
        assert_eq!(refreshed.items.len(), 2);
        assert_eq!(stack.indexer.page_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_purchase_invalidates_project_users() {
        let stack = setup().await;
        stack.indexer.set_users(vec![ProjectUser {
            user: BUYER.to_string(),
            access_expires_at: 1_700_086_400,
            first_purchase_at: 1_700_000_000,
        }]);

        stack.state.users.get_project_users(CHAIN, 42, None, None).await.unwrap();
        stack.state.users.get_project_users(CHAIN, 42, None, None).await.unwrap();
        assert_eq!(stack.indexer.page_calls.load(Ordering::SeqCst), 1);

        stack.state.accounting.record_purchase(CHAIN, 42, BUYER).await.unwrap();
        stack.state.users.get_project_users(CHAIN, 42, None, None).await.unwrap();
        assert_eq!(stack.indexer.page_calls.load(Ordering::SeqCst), 2);
    }
}
