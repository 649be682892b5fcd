//! Session gate and route guarding
//!
//! [`derive_gate_state`] collapses the three session signals into one
//! [`GateState`]. [`RouteGuard`] turns a gate state plus the destination the
//! user is heading to into at most one navigation command, and stays quiet
//! when asked again about the same inputs.

use log::debug;

/// Which part of the application the session may see
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateState {
    /// Session still resolving; show a progress indicator
    Loading,
    /// Nobody signed in
    Unauthenticated,
    /// Signed in without a completed profile
    NeedsOnboarding,
    /// Signed in with a completed profile
    Active,
}

/// Derive the gate state from the session signals
pub fn derive_gate_state(is_loading: bool, is_authenticated: bool, has_completed_profile: bool) -> GateState {
    match (is_loading, is_authenticated, has_completed_profile) {
        (true, _, _) => GateState::Loading,
        (false, false, _) => GateState::Unauthenticated,
        (false, true, false) => GateState::NeedsOnboarding,
        (false, true, true) => GateState::Active,
    }
}

/// Destinations the guard treats specially
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    /// Reachable without signing in; signed-in users are sent home
    pub public: Vec<String>,
    pub login: String,
    pub onboarding: String,
    pub home: String,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            public: ["/login", "/signup", "/forgot-password", "/reset-password"]
                .iter()
                .map(|p| p.to_string())
                .collect(),
            login: "/login".to_string(),
            onboarding: "/onboarding".to_string(),
            home: "/".to_string(),
        }
    }
}

impl RouteTable {
    pub fn is_public(&self, destination: &str) -> bool {
        self.public.iter().any(|p| p == destination)
    }

    /// Where to go after signing in, given the origin preserved by a redirect
    pub fn after_sign_in<'a>(&'a self, origin: Option<&'a str>) -> &'a str {
        match origin {
            Some(o) if !self.is_public(o) => o,
            _ => &self.home,
        }
    }
}

/// A navigation command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub to: String,
    /// Original destination, kept so the user can return after signing in
    pub from: Option<String>,
}

/// Outcome of guarding one destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Session still loading, nothing decided
    Wait,
    /// The destination may be shown
    Allow,
    Redirect(Redirect),
}

/// Surface that performs navigation
pub trait Navigator {
    fn redirect_to(&self, redirect: &Redirect);
}

/// Pure routing rule for one gate state and destination
pub fn decide(routes: &RouteTable, state: GateState, destination: &str) -> Decision {
    match state {
        GateState::Loading => Decision::Wait,
        GateState::Unauthenticated if routes.is_public(destination) => Decision::Allow,
        GateState::Unauthenticated => Decision::Redirect(Redirect {
            to: routes.login.clone(),
            from: Some(destination.to_string()),
        }),
        GateState::NeedsOnboarding if destination == routes.onboarding => Decision::Allow,
        GateState::NeedsOnboarding => Decision::Redirect(Redirect {
            to: routes.onboarding.clone(),
            from: None,
        }),
        GateState::Active if routes.is_public(destination) || destination == routes.onboarding => {
            Decision::Redirect(Redirect {
                to: routes.home.clone(),
                from: None,
            })
        }
        GateState::Active => Decision::Allow,
    }
}

/// Applies [`decide`] and issues navigation, once per distinct input
#[derive(Debug)]
pub struct RouteGuard {
    routes: RouteTable,
    last: Option<(GateState, String)>,
}

impl RouteGuard {
    pub fn new(routes: RouteTable) -> Self {
        Self { routes, last: None }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Evaluate `destination` under `state`. The navigator is called only
    /// for a redirect whose inputs differ from the previous evaluation.
    pub fn evaluate(&mut self, state: GateState, destination: &str, navigator: &dyn Navigator) -> Decision {
        let decision = decide(&self.routes, state, destination);
        if decision == Decision::Wait {
            return decision;
        }

        let inputs = (state, destination.to_string());
        if self.last.as_ref() == Some(&inputs) {
            return decision;
        }
        self.last = Some(inputs);

        if let Decision::Redirect(redirect) = &decision {
            debug!("{:?}: redirecting {} -> {}", state, destination, redirect.to);
            navigator.redirect_to(redirect);
        }
        decision
    }
}
