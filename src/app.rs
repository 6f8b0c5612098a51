//! Assembles the bus, session, menu machine and controllers.

use std::sync::Arc;

use tracing::info;

use crate::{
    config::AppConfig,
    controller::{
        Deps, login::LoginController, meal::MealController, review::ReviewController,
        user::UserController, weekly::WeeklyController,
    },
    credential::{Argon2Credentials, Credentials},
    error::{BusError, CanteenResult},
    meal::UserDraft,
    persist::{MemoryRepository, Repository, sqlite::SqliteRepository},
    present::Presenter,
    runtime::{
        bus::EventBus,
        events::{Event, EventName, Payload},
        menu::MenuStateMachine,
        session::SessionHandle,
    },
    types::{MenuState, Role},
};

/// A fully wired canteen: every handler is subscribed once, at build time.
pub struct App {
    bus: EventBus,
    session: SessionHandle,
    repo: Arc<dyn Repository>,
    menu: Arc<MenuStateMachine>,
    login: Arc<LoginController>,
    meals: Arc<MealController>,
    reviews: Arc<ReviewController>,
    users: Arc<UserController>,
    weekly: Arc<WeeklyController>,
}

impl App {
    /// Opens the repository named by `config` and wires it with Argon2 hashing.
    pub fn open(config: &AppConfig, presenter: Arc<dyn Presenter>) -> CanteenResult<Self> {
        let repo: Arc<dyn Repository> = match &config.database_path {
            Some(path) => Arc::new(SqliteRepository::open(path)?),
            None => Arc::new(MemoryRepository::new()),
        };
        Self::build(config, repo, presenter, Arc::new(Argon2Credentials))
    }

    /// Wires the given collaborators and ensures the bootstrap admin exists.
    pub fn build(
        config: &AppConfig,
        repo: Arc<dyn Repository>,
        presenter: Arc<dyn Presenter>,
        credentials: Arc<dyn Credentials>,
    ) -> CanteenResult<Self> {
        if let Some(admin) = &config.admin {
            if repo.find_user_by_name(&admin.name)?.is_none() {
                let user = repo.insert_user(UserDraft {
                    name: admin.name.clone(),
                    email: admin.email.clone(),
                    password_hash: credentials.hash(&admin.password)?,
                    role: Role::Admin,
                })?;
                info!(user_id = user.id, name = %user.name, "bootstrap admin created");
            }
        }

        let bus = EventBus::with_max_depth(config.max_dispatch_depth);
        let session = SessionHandle::new();
        let deps = Deps {
            repo: Arc::clone(&repo),
            session: session.clone(),
            presenter: Arc::clone(&presenter),
            credentials,
        };

        let menu = Arc::new(MenuStateMachine::new(session.clone(), presenter));
        menu.attach(&bus);
        let login = Arc::new(LoginController::new(deps.clone()));
        login.attach(&bus);
        let meals = Arc::new(MealController::new(deps.clone()));
        meals.attach(&bus);
        let reviews = Arc::new(ReviewController::new(deps.clone()));
        reviews.attach(&bus);
        let users = Arc::new(UserController::new(deps.clone()));
        users.attach(&bus);
        let weekly = Arc::new(WeeklyController::new(deps));
        weekly.attach(&bus);

        Ok(Self {
            bus,
            session,
            repo,
            menu,
            login,
            meals,
            reviews,
            users,
            weekly,
        })
    }

    /// Shows the logged-out menu.
    pub fn start(&self) {
        self.menu.start();
    }

    /// Publishes on the application bus.
    pub fn publish(&self, name: EventName, payload: Payload) -> Result<(), BusError> {
        self.bus.publish(name, payload)
    }

    /// Publishes an already built event.
    pub fn publish_event(&self, event: &Event) -> Result<(), BusError> {
        self.bus.publish_event(event)
    }

    /// Bus every controller is attached to.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Shared session handle.
    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Catalog persistence.
    pub fn repository(&self) -> &Arc<dyn Repository> {
        &self.repo
    }

    /// Menu currently shown.
    pub fn menu_state(&self) -> MenuState {
        self.menu.current()
    }

    /// True once `EXIT` was handled.
    pub fn is_exited(&self) -> bool {
        self.menu.is_exited()
    }

    /// Account and session handlers.
    pub fn login(&self) -> &LoginController {
        &self.login
    }

    /// Meal catalog handlers.
    pub fn meals(&self) -> &MealController {
        &self.meals
    }

    /// Review handlers.
    pub fn reviews(&self) -> &ReviewController {
        &self.reviews
    }

    /// User administration handlers.
    pub fn users(&self) -> &UserController {
        &self.users
    }

    /// Weekly plan handlers.
    pub fn weekly(&self) -> &WeeklyController {
        &self.weekly
    }
}
