use chrono::NaiveDate;
use gym_console::{
    Decision,
    error::ValidationError,
    models::{
        Client, Credentials, EnrollRequest, Enrollment, GymClass, LoginResponse, Membership,
        Payment, Product, Role, UserAccount, Validate,
    },
    roster::{ClassRoster, RosterError, RosterView},
};
use serde_json::json;

fn client(id: i64, active: bool) -> Client {
    Client {
        id: Some(id),
        first_name: "Ana".to_string(),
        last_name: "Pérez".to_string(),
        document: format!("DOC-{id}"),
        active,
        ..Default::default()
    }
}

fn class(capacity: u32) -> GymClass {
    GymClass {
        id: Some(1),
        name: "Spinning".to_string(),
        capacity,
        schedule: "Mon/Wed 18:00".to_string(),
        ..Default::default()
    }
}

fn enrolled(client_ids: &[i64]) -> Vec<Enrollment> {
    client_ids
        .iter()
        .map(|&client_id| Enrollment {
            class_id: 1,
            client_id,
            ..Default::default()
        })
        .collect()
}

#[cfg(test)]
mod role_tests {
    use super::*;

    #[test]
    fn test_role_accepts_english_and_spanish_names() {
        let cases = [
            ("administrator", Role::Administrator),
            ("Administrador", Role::Administrator),
            ("ADMIN", Role::Administrator),
            ("recepcionista", Role::Receptionist),
            (" receptionist ", Role::Receptionist),
            ("Entrenador", Role::Trainer),
            ("trainer", Role::Trainer),
        ];
        for (raw, expected) in cases {
            assert_eq!(raw.parse::<Role>(), Ok(expected), "{raw}");
        }
    }

    #[test]
    fn test_unknown_role_is_an_error() {
        assert!("gerente".parse::<Role>().is_err());
        assert!(serde_json::from_value::<Role>(json!("gerente")).is_err());
    }

    #[test]
    fn test_role_serializes_in_lowercase_english() {
        assert_eq!(serde_json::to_value(Role::Receptionist).unwrap(), json!("receptionist"));
        let account: UserAccount = serde_json::from_value(json!({
            "username": "recepcion1",
            "role": "Recepcionista"
        }))
        .unwrap();
        assert_eq!(account.role, Role::Receptionist);
        assert!(account.active);
    }

    #[test]
    fn test_only_administrator_is_privileged() {
        assert!(Role::Administrator.is_privileged());
        for role in [Role::Receptionist, Role::Trainer, Role::Anonymous] {
            assert!(!role.is_privileged());
        }
    }

    #[test]
    fn test_login_response_role_locations() {
        let top: LoginResponse =
            serde_json::from_value(json!({ "token": "t", "role": "administrador" })).unwrap();
        assert_eq!(top.resolved_role(), Some(Role::Administrator));

        let nested: LoginResponse =
            serde_json::from_value(json!({ "token": "t", "user": { "rol": "entrenador" } }))
                .unwrap();
        assert_eq!(nested.resolved_role(), Some(Role::Trainer));

        let unknown: LoginResponse =
            serde_json::from_value(json!({ "token": "t", "role": "gerente" })).unwrap();
        assert_eq!(unknown.resolved_role(), None);

        let missing: LoginResponse = serde_json::from_value(json!({ "token": "t" })).unwrap();
        assert_eq!(missing.resolved_role(), None);
    }
}

#[cfg(test)]
mod validation_tests {
    use super::*;

    #[test]
    fn test_valid_client_passes() {
        let mut valid = client(1, true);
        valid.email = Some("ana@gym.test".to_string());
        assert!(valid.validate().is_ok());
    }

    #[test]
    fn test_client_requires_names_and_document() {
        let mut missing = client(1, true);
        missing.document = "  ".to_string();
        assert_eq!(
            missing.validate(),
            Err(ValidationError::new("document", "must not be empty"))
        );
    }

    #[test]
    fn test_client_email_must_look_like_an_address() {
        let mut bad = client(1, true);
        bad.email = Some("ana.gym.test".to_string());
        assert_eq!(bad.validate().unwrap_err().field, "email");

        // Blank email is treated as not provided.
        bad.email = Some(String::new());
        assert!(bad.validate().is_ok());
    }

    #[test]
    fn test_membership_needs_price_and_duration() {
        let mut plan = Membership {
            name: "Mensual".to_string(),
            price: 30.0,
            duration_days: 30,
            ..Default::default()
        };
        assert!(plan.validate().is_ok());

        plan.duration_days = 0;
        assert_eq!(plan.validate().unwrap_err().field, "duration_days");

        plan.duration_days = 30;
        plan.price = 0.0;
        assert_eq!(plan.validate().unwrap_err().field, "price");
    }

    #[test]
    fn test_product_stock_cannot_be_negative() {
        let product = Product {
            name: "Proteína".to_string(),
            price: 25.5,
            stock: -1,
            ..Default::default()
        };
        assert_eq!(product.validate().unwrap_err().field, "stock");
    }

    #[test]
    fn test_payment_amount_and_method() {
        let mut payment = Payment {
            id: None,
            client_id: 1,
            membership_id: Some(2),
            amount: 30.0,
            method: "efectivo".to_string(),
            paid_on: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        };
        assert!(payment.validate().is_ok());

        payment.amount = -5.0;
        assert_eq!(payment.validate().unwrap_err().field, "amount");

        payment.amount = f64::NAN;
        assert_eq!(payment.validate().unwrap_err().field, "amount");
    }

    #[test]
    fn test_credentials_must_not_be_blank() {
        let credentials = Credentials {
            username: "admin".to_string(),
            password: String::new(),
        };
        assert_eq!(credentials.validate().unwrap_err().field, "password");
    }

    #[test]
    fn test_class_needs_capacity() {
        assert_eq!(class(0).validate().unwrap_err().field, "capacity");
        assert!(class(10).validate().is_ok());
    }

    #[test]
    fn test_enroll_request_needs_a_client() {
        assert!(EnrollRequest { client_id: 0 }.validate().is_err());
        assert!(EnrollRequest { client_id: 4 }.validate().is_ok());
    }
}

#[cfg(test)]
mod roster_tests {
    use super::*;

    #[test]
    fn test_remaining_places() {
        let roster = ClassRoster::new(class(3), enrolled(&[1, 2]));
        assert_eq!(roster.enrolled_count(), 2);
        assert_eq!(roster.remaining(), 1);
        assert!(!roster.is_full());
    }

    #[test]
    fn test_overbooked_class_saturates_at_zero() {
        let roster = ClassRoster::new(class(1), enrolled(&[1, 2, 3]));
        assert_eq!(roster.remaining(), 0);
        assert!(roster.is_full());
    }

    #[test]
    fn test_full_class_rejects_enrollment() {
        let roster = ClassRoster::new(class(2), enrolled(&[1, 2]));
        assert_eq!(
            roster.check_enrollment(3),
            Err(RosterError::ClassFull { capacity: 2 })
        );
    }

    #[test]
    fn test_duplicate_enrollment_is_reported_before_capacity() {
        let roster = ClassRoster::new(class(2), enrolled(&[1, 2]));
        assert_eq!(
            roster.check_enrollment(2),
            Err(RosterError::AlreadyEnrolled { client_id: 2 })
        );
    }

    #[test]
    fn test_available_clients_excludes_enrolled_and_inactive() {
        let roster = ClassRoster::new(class(10), enrolled(&[1]));
        let mut unsaved = client(0, true);
        unsaved.id = None;
        let clients = vec![client(1, true), client(2, true), client(3, false), unsaved];

        let view = RosterView::new(roster, &clients);

        assert_eq!(view.remaining, 9);
        assert_eq!(view.available, vec![client(2, true)]);
    }
}

#[cfg(test)]
mod decision_tests {
    use super::*;

    #[test]
    fn test_decision_wire_format() {
        let redirect = Decision::Redirect {
            to: "/login".to_string(),
            replace: true,
        };
        assert_eq!(
            serde_json::to_value(&redirect).unwrap(),
            json!({ "action": "redirect", "to": "/login", "replace": true })
        );
        assert_eq!(
            serde_json::to_value(Decision::Render).unwrap(),
            json!({ "action": "render" })
        );
    }
}
