mod mongo;

pub use mongo::MongoDocumentSource;
