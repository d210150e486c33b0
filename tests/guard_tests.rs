use gym_console::{
    guard::{
        Decision, LANDING_PATH, LOGIN_PATH, NavigationRequest, PolicyError, RouteGuard,
        RoutePattern, RoutePolicy,
    },
    models::Role,
    session::Session,
};

// --- Test Utilities ---

const PUBLIC_PATHS: [&str; 3] = ["/", "/login", "/ayuda"];

const PROTECTED_PATHS: [&str; 12] = [
    "/dashboard",
    "/clientes",
    "/clientes/12",
    "/membresias",
    "/pagos",
    "/productos/3",
    "/clases",
    "/clases/4/inscripciones",
    "/rutinas",
    "/consultas/clientes/9",
    "/usuarios",
    "/contabilidad",
];

fn session(role: Role) -> Session {
    Session::new("test-token", role).unwrap()
}

fn guard() -> RouteGuard {
    RouteGuard::standard().expect("standard route table is valid")
}

fn to_login() -> Decision {
    Decision::Redirect {
        to: LOGIN_PATH.to_string(),
        replace: true,
    }
}

fn to_dashboard() -> Decision {
    Decision::Redirect {
        to: LANDING_PATH.to_string(),
        replace: true,
    }
}

// --- Properties ---

#[test]
fn test_public_paths_render_regardless_of_session() {
    let guard = guard();
    for path in PUBLIC_PATHS {
        let request = NavigationRequest::to(path);
        assert_eq!(guard.evaluate(&request, None), Decision::Render, "{path}");
        for role in Role::ALL {
            assert_eq!(
                guard.evaluate(&request, Some(&session(role))),
                Decision::Render,
                "{path} as {role}"
            );
        }
    }
}

#[test]
fn test_protected_paths_without_session_redirect_to_login() {
    let guard = guard();
    for path in PROTECTED_PATHS.iter().chain(["/perfil"].iter()) {
        assert_eq!(
            guard.evaluate(&NavigationRequest::to(path), None),
            to_login(),
            "{path}"
        );
    }
}

#[test]
fn test_administrator_renders_every_protected_path() {
    let guard = guard();
    let admin = session(Role::Administrator);
    for path in PROTECTED_PATHS {
        assert_eq!(
            guard.evaluate(&NavigationRequest::to(path), Some(&admin)),
            Decision::Render,
            "{path}"
        );
    }
}

#[test]
fn test_role_mismatch_redirects_to_dashboard() {
    let guard = guard();
    let cases = [
        (Role::Receptionist, "/usuarios"),
        (Role::Receptionist, "/rutinas"),
        (Role::Receptionist, "/contabilidad"),
        (Role::Trainer, "/clientes"),
        (Role::Trainer, "/clases/4/inscripciones"),
        (Role::Trainer, "/pagos"),
        (Role::Anonymous, "/clientes"),
        (Role::Anonymous, "/clases"),
    ];
    for (role, path) in cases {
        assert_eq!(
            guard.evaluate(&NavigationRequest::to(path), Some(&session(role))),
            to_dashboard(),
            "{path} as {role}"
        );
    }
}

#[test]
fn test_every_role_reaches_the_dashboard() {
    let guard = guard();
    for role in Role::ALL {
        assert_eq!(
            guard.evaluate(&NavigationRequest::to(LANDING_PATH), Some(&session(role))),
            Decision::Render
        );
    }
}

#[test]
fn test_unlisted_path_only_requires_a_session() {
    let guard = guard();
    assert_eq!(
        guard.evaluate(&NavigationRequest::to("/perfil"), Some(&session(Role::Trainer))),
        Decision::Render
    );
}

#[test]
fn test_public_override_skips_the_session_check() {
    let guard = guard();
    let request = NavigationRequest {
        path: "/clientes".to_string(),
        public: true,
    };
    assert_eq!(guard.evaluate(&request, None), Decision::Render);
}

#[test]
fn test_evaluation_does_not_depend_on_query_string() {
    let guard = guard();
    assert_eq!(
        guard.evaluate(
            &NavigationRequest::to("/usuarios?page=2"),
            Some(&session(Role::Receptionist))
        ),
        to_dashboard()
    );
}

// --- Scenarios ---

#[test]
fn test_scenario_no_session_on_clients() {
    assert_eq!(
        guard().evaluate(&NavigationRequest::to("/clientes"), None),
        to_login()
    );
}

#[test]
fn test_scenario_receptionist_on_users() {
    assert_eq!(
        guard().evaluate(
            &NavigationRequest::to("/usuarios"),
            Some(&session(Role::Receptionist))
        ),
        to_dashboard()
    );
}

#[test]
fn test_scenario_administrator_on_users() {
    assert_eq!(
        guard().evaluate(
            &NavigationRequest::to("/usuarios"),
            Some(&session(Role::Administrator))
        ),
        Decision::Render
    );
}

// --- Patterns ---

#[test]
fn test_pattern_wildcard_matches_collection_and_children() {
    let pattern = RoutePattern::parse("/clientes/*").unwrap();
    assert!(pattern.matches("/clientes"));
    assert!(pattern.matches("/clientes/"));
    assert!(pattern.matches("/clientes/5/editar"));
    assert!(pattern.matches("/clientes?orden=nombre"));
    assert!(!pattern.matches("/clientesx"));
    assert!(!pattern.matches("/"));
}

#[test]
fn test_pattern_param_matches_exactly_one_segment() {
    let pattern = RoutePattern::parse("/clases/:id/inscripciones").unwrap();
    assert!(pattern.matches("/clases/7/inscripciones"));
    assert!(!pattern.matches("/clases/inscripciones"));
    assert!(!pattern.matches("/clases/7/inscripciones/2"));
}

#[test]
fn test_root_pattern_matches_only_root() {
    let pattern = RoutePattern::parse("/").unwrap();
    assert!(pattern.matches("/"));
    assert!(!pattern.matches("/dashboard"));
}

// --- Table Validation ---

#[test]
fn test_invalid_patterns_are_rejected() {
    assert_eq!(
        RoutePattern::parse("clientes"),
        Err(PolicyError::InvalidPattern("clientes".to_string()))
    );
    assert_eq!(
        RoutePattern::parse("/*/clientes"),
        Err(PolicyError::MisplacedWildcard("/*/clientes".to_string()))
    );
}

#[test]
fn test_empty_role_set_is_a_configuration_error() {
    let policies = vec![
        RoutePolicy::public(LOGIN_PATH).unwrap(),
        RoutePolicy::roles(LANDING_PATH, &Role::ALL).unwrap(),
        RoutePolicy::roles("/usuarios", &[]).unwrap(),
    ];
    assert_eq!(
        RouteGuard::new(policies, LOGIN_PATH, LANDING_PATH).unwrap_err(),
        PolicyError::EmptyRoleSet("/usuarios".to_string())
    );
}

#[test]
fn test_duplicate_patterns_are_rejected() {
    let policies = vec![
        RoutePolicy::public(LOGIN_PATH).unwrap(),
        RoutePolicy::roles("/pagos", &[Role::Receptionist]).unwrap(),
        RoutePolicy::roles("/pagos", &[Role::Trainer]).unwrap(),
    ];
    assert_eq!(
        RouteGuard::new(policies, LOGIN_PATH, LANDING_PATH).unwrap_err(),
        PolicyError::DuplicatePattern("/pagos".to_string())
    );
}

#[test]
fn test_login_must_be_public() {
    let policies = vec![RoutePolicy::roles(LOGIN_PATH, &[Role::Administrator]).unwrap()];
    assert_eq!(
        RouteGuard::new(policies, LOGIN_PATH, LANDING_PATH).unwrap_err(),
        PolicyError::LoginNotPublic(LOGIN_PATH.to_string())
    );
}

#[test]
fn test_landing_page_must_render_for_every_role() {
    let policies = vec![
        RoutePolicy::public(LOGIN_PATH).unwrap(),
        RoutePolicy::roles(LANDING_PATH, &[Role::Receptionist, Role::Trainer]).unwrap(),
    ];
    assert_eq!(
        RouteGuard::new(policies, LOGIN_PATH, LANDING_PATH).unwrap_err(),
        PolicyError::LandingUnreachable {
            path: LANDING_PATH.to_string(),
            role: Role::Anonymous,
        }
    );
}
