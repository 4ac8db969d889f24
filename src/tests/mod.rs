mod backend_tests;
mod wallet_tests;
