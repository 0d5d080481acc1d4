//! One user session: the current route and both screens.
//!
//! # Design
//! The screens never reach into each other. Cross-screen effects go through
//! the session: a successful create invalidates every cached list page.

use student_core::{FormMode, Route};
use tracing::debug;

use crate::api::StudentsApi;
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::screens::{FormScreen, StudentsScreen, Submitted};

pub struct Session {
    route: Route,
    students: StudentsScreen,
    form: FormScreen,
}

impl Session {
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let api = StudentsApi::new(config)?;
        Ok(Self {
            route: Route::Students { page: 1 },
            students: StudentsScreen::new(api.clone(), config.page_limit),
            form: FormScreen::new(api, FormMode::Add),
        })
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn students(&mut self) -> &mut StudentsScreen {
        &mut self.students
    }

    pub fn form(&mut self) -> &mut FormScreen {
        &mut self.form
    }

    /// Switch screens. The list starts (or reuses) its page fetch without
    /// waiting; the form waits for its edit record.
    pub async fn navigate(&mut self, location: &str) -> AppResult<()> {
        let route = Route::parse(location).ok_or_else(|| AppError::UnknownRoute(location.to_string()))?;
        self.open(route).await
    }

    /// `navigate` for a route value already in hand.
    pub async fn open(&mut self, route: Route) -> AppResult<()> {
        debug!(%route, "navigate");
        if let Route::Students { page } = route {
            self.students.show_page(page);
            self.route = route;
            return Ok(());
        }
        self.form.navigate(&route);
        self.route = route;
        self.form.load().await?;
        Ok(())
    }

    pub async fn submit(&mut self) -> Submitted {
        let submitted = self.form.submit().await;
        if submitted.created {
            self.students.invalidate_pages();
        }
        submitted
    }

    /// Text for the current screen, settling pending list fetches first.
    pub async fn render(&mut self) -> String {
        match self.route {
            Route::Students { .. } => {
                self.students.wait_idle().await;
                self.students.render()
            }
            Route::AddStudent | Route::EditStudent(_) => self.form.render(),
        }
    }
}
