mod support;

mod api_tests;
mod user_tests;
