pub mod fetcher;
pub mod html;

pub use fetcher::ReqwestFetcher;
pub use html::HtmlExtractor;
