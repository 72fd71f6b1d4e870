//! Identity extraction and the authorization predicate.
//!
//! Authentication itself is an external collaborator: the upstream
//! gateway validates credentials and forwards the result as trusted
//! `x-user-id` / `x-user-role` headers. Every handler then runs the same
//! [`authorize`] predicate instead of carrying its own role checks.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::{Role, UserId};
use uuid::Uuid;

use crate::error::ApiError;

/// An authenticated caller.
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub user_id: UserId,
    pub role: Role,
}

/// Everything a caller can ask the API to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ManageCatalog,
    ManageOrders,
    ManageCache,
    SubscribeAdminOrders,
    ViewCart,
    MutateCart,
    PlaceOrder,
    ViewOwnOrders,
    SubscribeOrders,
}

/// The single authorization predicate gating every operation.
pub fn authorize(identity: &Identity, operation: Operation) -> Result<(), ApiError> {
    let allowed = match operation {
        Operation::ManageCatalog
        | Operation::ManageOrders
        | Operation::ManageCache
        | Operation::SubscribeAdminOrders => identity.role.is_admin(),
        Operation::ViewCart
        | Operation::MutateCart
        | Operation::PlaceOrder
        | Operation::ViewOwnOrders => identity.role == Role::Customer,
        Operation::SubscribeOrders => true,
    };

    if allowed {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "You do not have permission to perform this action".to_string(),
        ))
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value).ok())
            .map(UserId::from_uuid);
        let role = parts
            .headers
            .get("x-user-role")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<Role>().ok());

        match (user_id, role) {
            (Some(user_id), Some(role)) => Ok(Identity { user_id, role }),
            _ => Err(ApiError::Unauthorized(
                "Authentication credentials were not provided".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: Role) -> Identity {
        Identity {
            user_id: UserId::new(),
            role,
        }
    }

    #[test]
    fn admin_operations_require_admin() {
        for operation in [
            Operation::ManageCatalog,
            Operation::ManageOrders,
            Operation::ManageCache,
            Operation::SubscribeAdminOrders,
        ] {
            assert!(authorize(&identity(Role::Admin), operation).is_ok());
            assert!(authorize(&identity(Role::Customer), operation).is_err());
        }
    }

    #[test]
    fn customer_operations_require_customer() {
        for operation in [
            Operation::ViewCart,
            Operation::MutateCart,
            Operation::PlaceOrder,
            Operation::ViewOwnOrders,
        ] {
            assert!(authorize(&identity(Role::Customer), operation).is_ok());
            assert!(authorize(&identity(Role::Admin), operation).is_err());
        }
    }

    #[test]
    fn any_identity_may_subscribe_to_own_orders() {
        assert!(authorize(&identity(Role::Customer), Operation::SubscribeOrders).is_ok());
        assert!(authorize(&identity(Role::Admin), Operation::SubscribeOrders).is_ok());
    }
}
