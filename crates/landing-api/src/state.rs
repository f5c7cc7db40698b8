use std::sync::Arc;

use landing_core::Settings;

use crate::{ctftime::CtftimeClient, db::Store, hetzner::HetznerClient, ApiResult};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub store: Store,
    pub ctftime: Arc<CtftimeClient>,
    pub hetzner: Arc<HetznerClient>,
}

impl AppState {
    pub async fn new(settings: Arc<Settings>) -> ApiResult<Self> {
        let store = Store::connect(&settings.database.url).await?;
        let ctftime = Arc::new(CtftimeClient::new(settings.oauth.clone()));
        let hetzner = Arc::new(HetznerClient::new(settings.hetzner.clone()));

        Ok(Self {
            settings,
            store,
            ctftime,
            hetzner,
        })
    }
}
