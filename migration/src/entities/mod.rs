pub mod url_record;

pub use url_record::Entity as UrlRecordEntity;
