// GraphQL documents sent to the indexer

const PROJECT_FIELDS: &str = r#"
    projectId
    address
    owner
    paused
    paymentMethods
    packages { packageId accessDuration price paymentMethod }
    extraTimes { extraTimeId accessDuration price paymentMethod }
    updateTimestamp
"#;

pub fn project() -> String {
    format!(
        r#"query Project($chainId: BigInt!, $projectId: BigInt!) {{
  project(chainId: $chainId, projectId: $projectId) {{ {} }}
}}"#,
        PROJECT_FIELDS
    )
}

pub fn owned_projects() -> String {
    format!(
        r#"query OwnedProjects($chainId: BigInt!, $owner: String!, $after: String, $first: Int!) {{
  ownedProjects(chainId: $chainId, owner: $owner, after: $after, first: $first) {{
    items {{ {} }}
    pageInfo {{ endCursor hasNextPage }}
  }}
}}"#,
        PROJECT_FIELDS
    )
}

pub const TIME_SERIES: &str = r#"query Statistics($chainId: BigInt!, $projectId: BigInt!, $tick: BigInt!, $type: Int!, $subType: Int!, $timeGap: BigInt!, $paymentMethod: String) {
  statistics(chainId: $chainId, projectId: $projectId, tick: $tick, type: $type, subType: $subType, timeGap: $timeGap, paymentMethod: $paymentMethod) {
    value
    timeIndex
  }
}"#;

pub const PROJECT_INCOMES: &str = r#"query ProjectIncomes($chainId: BigInt!, $projectId: BigInt!, $after: String, $first: Int!) {
  projectIncomes(chainId: $chainId, projectId: $projectId, after: $after, first: $first) {
    items { txHash buyer paymentMethod amount timestamp }
    pageInfo { endCursor hasNextPage }
  }
}"#;

pub const PROJECT_USERS: &str = r#"query ProjectUsers($chainId: BigInt!, $projectId: BigInt!, $after: String, $first: Int!) {
  projectUsers(chainId: $chainId, projectId: $projectId, after: $after, first: $first) {
    items { user accessExpiresAt firstPurchaseAt }
    pageInfo { endCursor hasNextPage }
  }
}"#;

pub const USER_PURCHASES: &str = r#"query UserPurchases($chainId: BigInt!, $user: String!, $after: String, $first: Int!) {
  userPurchases(chainId: $chainId, user: $user, after: $after, first: $first) {
    items { txHash projectId paymentMethod amount accessDuration timestamp }
    pageInfo { endCursor hasNextPage }
  }
}"#;
