use crate::domain::models::UserRole;
use crate::state::SharedState;
use crate::web::session::MaybeUser;
use axum::{
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};

/// Outcome of the role gate for a page route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    Redirect(&'static str),
}

/// Where a signed-in role lands by default.
pub fn landing_for(role: UserRole) -> &'static str {
    match role {
        UserRole::Admin | UserRole::Manager => "/admin",
        UserRole::Employee => "/employee",
    }
}

/// The four documented branches: unauthenticated users go to login; an
/// empty required set admits any authenticated user; a role outside the
/// required set is sent to its own landing page.
pub fn route_decision(role: Option<UserRole>, required: &[UserRole]) -> RouteDecision {
    match role {
        None => RouteDecision::Redirect("/login"),
        Some(role) if required.is_empty() || required.contains(&role) => RouteDecision::Allow,
        Some(role) => RouteDecision::Redirect(landing_for(role)),
    }
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/login", get(login_page))
        .route("/admin", get(admin_page))
        .route("/employee", get(employee_page))
        .with_state(state)
}

fn render(decision: RouteDecision, page: &'static str) -> Response {
    match decision {
        RouteDecision::Allow => Html(page).into_response(),
        RouteDecision::Redirect(to) => Redirect::to(to).into_response(),
    }
}

async fn index(MaybeUser(user): MaybeUser) -> Response {
    match user {
        Some(user) => Redirect::to(landing_for(user.role)).into_response(),
        None => Redirect::to("/login").into_response(),
    }
}

async fn login_page() -> Html<&'static str> {
    Html("<!doctype html><title>SurveyLab :: sign in</title><h1>Sign in</h1>")
}

async fn admin_page(MaybeUser(user): MaybeUser) -> Response {
    render(
        route_decision(
            user.map(|u| u.role),
            &[UserRole::Admin, UserRole::Manager],
        ),
        "<!doctype html><title>SurveyLab :: admin</title><h1>Admin dashboard</h1>",
    )
}

async fn employee_page(MaybeUser(user): MaybeUser) -> Response {
    render(
        route_decision(user.map(|u| u.role), &[UserRole::Employee]),
        "<!doctype html><title>SurveyLab :: my surveys</title><h1>My surveys</h1>",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthenticated_goes_to_login() {
        assert_eq!(
            route_decision(None, &[UserRole::Admin, UserRole::Manager]),
            RouteDecision::Redirect("/login")
        );
        assert_eq!(route_decision(None, &[]), RouteDecision::Redirect("/login"));
    }

    #[test]
    fn test_role_in_required_set_is_allowed() {
        let required = [UserRole::Admin, UserRole::Manager];
        assert_eq!(
            route_decision(Some(UserRole::Admin), &required),
            RouteDecision::Allow
        );
        assert_eq!(
            route_decision(Some(UserRole::Manager), &required),
            RouteDecision::Allow
        );
    }

    #[test]
    fn test_role_outside_set_lands_on_own_area() {
        assert_eq!(
            route_decision(Some(UserRole::Employee), &[UserRole::Admin, UserRole::Manager]),
            RouteDecision::Redirect("/employee")
        );
        assert_eq!(
            route_decision(Some(UserRole::Admin), &[UserRole::Employee]),
            RouteDecision::Redirect("/admin")
        );
    }

    #[test]
    fn test_empty_required_set_admits_any_authenticated_role() {
        for role in [UserRole::Admin, UserRole::Manager, UserRole::Employee] {
            assert_eq!(route_decision(Some(role), &[]), RouteDecision::Allow);
        }
    }
}
