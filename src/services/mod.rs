pub mod engagement;
pub mod graph;
pub mod identity;
pub mod timeline;

pub use engagement::EngagementService;
pub use graph::GraphService;
pub use identity::IdentityService;
pub use timeline::TimelineService;

use crate::config::Config;
use crate::store::EntityStore;
use std::sync::Arc;

/// All services wired to one shared store.
#[derive(Clone)]
pub struct Services {
    pub identity: IdentityService,
    pub graph: GraphService,
    pub engagement: EngagementService,
    pub timeline: TimelineService,
}

impl Services {
    pub fn new(store: Arc<dyn EntityStore>, config: &Config) -> Self {
        let engagement = EngagementService::new(store.clone());
        Services {
            identity: IdentityService::new(
                store.clone(),
                config.jwt.clone(),
                config.password.clone(),
            ),
            graph: GraphService::new(store.clone()),
            timeline: TimelineService::new(store, engagement.clone()),
            engagement,
        }
    }
}
