use crate::config::Config;
use crate::services::object_storage::ObjectStorageClient;
use mongodb::{Client as MongoClient, Database};

pub struct AppState {
    pub config: Config,
    pub mongo: Database,
    pub storage: ObjectStorageClient,
}

impl AppState {
    pub fn new(config: Config, mongo_client: MongoClient) -> anyhow::Result<Self> {
        let mongo = mongo_client.database(&config.mongo_database);
        let storage = ObjectStorageClient::new(config.storage.clone())?;

        Ok(Self {
            config,
            mongo,
            storage,
        })
    }
}

pub mod certificate_layout;
pub mod certificate_service;
pub mod object_storage;
pub mod quiz_service;
