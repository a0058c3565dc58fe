use chrono::Utc;
use planner_api::Application;
use planner_domain::{encode_session_token, SessionClaims};
use planner_infra::{Config, FakeSys, ISys, InMemoryNotifier, PlannerContext};
use planner_sdk::PlannerSDK;
use std::sync::Arc;

pub struct TestApp {
    pub config: Config,
    pub address: String,
    /// Every notification the application has sent
    pub notifier: Arc<InMemoryNotifier>,
    /// Clock of the application, starts at the real time
    pub sys: Arc<FakeSys>,
}

impl TestApp {
    pub fn session_token(&self, subject: &str, email: &str) -> String {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: subject.into(),
            email: email.into(),
            name: None,
            iat: now as usize,
            exp: (now + 60 * 60) as usize,
        };
        encode_session_token(&claims, &self.config.session_secret)
            .expect("Expected to create session token")
    }

    /// SDK acting on behalf of the user with the given identity provider subject
    pub fn sdk_for(&self, subject: &str, email: &str) -> PlannerSDK {
        PlannerSDK::new(self.address.clone(), self.session_token(subject, email))
    }

    pub fn now(&self) -> i64 {
        self.sys.get_timestamp_millis()
    }
}

// Launch the application as a background task
pub async fn spawn_app() -> (TestApp, PlannerSDK) {
    let mut ctx = PlannerContext::create_inmemory();
    ctx.config.port = 0; // Random port
    ctx.config.reminders.tick_interval_secs = 1;

    let notifier = Arc::new(InMemoryNotifier::new());
    ctx.notifier = notifier.clone();
    let sys = Arc::new(FakeSys::new(Utc::now().timestamp_millis()));
    ctx.sys = sys.clone();

    let config = ctx.config.clone();
    let application = Application::new(ctx)
        .await
        .expect("Failed to build application.");

    let address = format!("http://localhost:{}", application.port());
    let _ = actix_web::rt::spawn(async move {
        application
            .start()
            .await
            .expect("Expected application to start");
    });

    let sdk = PlannerSDK::new(address.clone(), "");
    let app = TestApp {
        config,
        address,
        notifier,
        sys,
    };
    (app, sdk)
}
