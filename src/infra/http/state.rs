use std::sync::Arc;

use crate::application::activities::ActivityService;
use crate::application::auth::AuthService;
use crate::application::notifications::NotificationService;
use crate::application::portfolio::PortfolioService;
use crate::application::roadmaps::RoadmapService;
use crate::application::skills::SkillService;
use crate::infra::db::PostgresRepositories;
use crate::realtime::{EventBroker, RealtimeConfig};

#[derive(Clone)]
pub struct AppState {
    pub portfolio: PortfolioService,
    pub skills: SkillService,
    pub roadmaps: RoadmapService,
    pub notifications: NotificationService,
    pub activities: ActivityService,
    pub auth: AuthService,
    pub broker: Arc<EventBroker>,
    pub realtime: RealtimeConfig,
    pub db: Arc<PostgresRepositories>,
}
