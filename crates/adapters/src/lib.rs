pub mod facts;
pub mod speech;
pub mod translate;

pub use facts::{CategoryFactProvider, KeywordedFactsClient, RandomFactsClient, RemoteFactApi};
pub use speech::CommandSpeech;
pub use translate::WebTranslateClient;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
