pub mod bot_parser;
pub mod bot_provider;

pub use bot_provider::BotRateProvider;
