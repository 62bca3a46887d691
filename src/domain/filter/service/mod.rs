pub mod filter_history_service;
