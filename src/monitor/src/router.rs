use log::{error, info};

use crate::error::ActuatorError;
use crate::http::{Request, Response};
use crate::state::CpuInformation;

pub type Handler<C> = fn(&mut C, &Request) -> Response;

struct Route<C> {
    path: &'static str,
    // Also match `path` followed by `/`
    append_slash: bool,
    handler: Handler<C>,
}

impl<C> Route<C> {
    fn matches(&self, path: &str) -> bool {
        if path == self.path {
            return true;
        }
        self.append_slash && path.strip_suffix('/') == Some(self.path)
    }
}

/// Table from request path to handler, built once at startup.
pub struct Router<C> {
    routes: Vec<Route<C>>,
}

impl<C> Router<C> {
    pub fn new() -> Self {
        Router { routes: Vec::new() }
    }

    pub fn route(mut self, path: &'static str, handler: Handler<C>) -> Self {
        self.routes.push(Route {
            path,
            append_slash: false,
            handler,
        });
        self
    }

    pub fn route_with_slash(mut self, path: &'static str, handler: Handler<C>) -> Self {
        self.routes.push(Route {
            path,
            append_slash: true,
            handler,
        });
        self
    }

    pub fn paths(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.routes.iter().map(|route| route.path)
    }

    pub fn dispatch(&self, context: &mut C, request: &Request) -> Response {
        let Some(route) = self.routes.iter().find(|route| route.matches(&request.path)) else {
            info!("No route for {}", request.path);
            return Response::not_found();
        };
        if !request.is_get() {
            info!("Rejecting {:?} {}", request.method, request.path);
            return Response::method_not_allowed();
        }
        (route.handler)(context, request)
    }
}

impl<C> Default for Router<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// What the dashboard routes need from the device.
pub trait Dashboard {
    /// Render the status page.
    fn page(&mut self) -> Response;

    /// Flip the master switch of the lights.
    fn set_lights_enabled(&mut self, enabled: bool) -> Result<(), ActuatorError>;

    fn cpu_information(&mut self) -> CpuInformation;
}

/// The dashboard's routes.
pub fn dashboard<D: Dashboard>() -> Router<D> {
    Router::new()
        .route("/", index::<D>)
        .route("/lighton", light_on::<D>)
        .route("/lightoff", light_off::<D>)
        .route_with_slash("/cpu-information", cpu_information::<D>)
}

fn index<D: Dashboard>(dashboard: &mut D, _request: &Request) -> Response {
    dashboard.page()
}

fn light_on<D: Dashboard>(dashboard: &mut D, _request: &Request) -> Response {
    switch_lights(dashboard, true)
}

fn light_off<D: Dashboard>(dashboard: &mut D, _request: &Request) -> Response {
    switch_lights(dashboard, false)
}

fn switch_lights<D: Dashboard>(dashboard: &mut D, enabled: bool) -> Response {
    if let Err(e) = dashboard.set_lights_enabled(enabled) {
        error!("Failed to switch lights: {}", e);
        return Response::internal_error();
    }
    dashboard.page()
}

fn cpu_information<D: Dashboard>(dashboard: &mut D, _request: &Request) -> Response {
    let information = dashboard.cpu_information();
    match serde_json::to_string(&information) {
        Ok(json) => Response::json(json),
        Err(e) => {
            error!("Failed to serialise CPU information: {}", e);
            Response::internal_error()
        }
    }
}
