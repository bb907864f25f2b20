use std::fmt;

use common::UserId;

use super::AuthError;

/// Who may perform an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Anyone,
    Authenticated,
    Admin,
}

/// Every externally reachable operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Register,
    Login,
    RefreshToken,
    ListProducts,
    RetrieveProduct,
    CreateProduct,
    UpdateProduct,
    DeleteProduct,
    ListOrders,
    RetrieveOrder,
    CreateOrder,
    DeleteOrder,
    UpdateOrderStatus,
    InitiatePayment,
    VerifyPayment,
    DashboardStats,
    ProductAnalytics,
    ListUsers,
    ManageUser,
    ListAllOrders,
    AdminConfig,
}

impl Operation {
    pub const ALL: [Operation; 21] = [
        Operation::Register,
        Operation::Login,
        Operation::RefreshToken,
        Operation::ListProducts,
        Operation::RetrieveProduct,
        Operation::CreateProduct,
        Operation::UpdateProduct,
        Operation::DeleteProduct,
        Operation::ListOrders,
        Operation::RetrieveOrder,
        Operation::CreateOrder,
        Operation::DeleteOrder,
        Operation::UpdateOrderStatus,
        Operation::InitiatePayment,
        Operation::VerifyPayment,
        Operation::DashboardStats,
        Operation::ProductAnalytics,
        Operation::ListUsers,
        Operation::ManageUser,
        Operation::ListAllOrders,
        Operation::AdminConfig,
    ];

    /// The access level this operation requires.
    pub fn required_access(self) -> Access {
        match self {
            Operation::Register
            | Operation::Login
            | Operation::RefreshToken
            | Operation::ListProducts
            | Operation::RetrieveProduct => Access::Anyone,

            Operation::CreateProduct
            | Operation::ListOrders
            | Operation::RetrieveOrder
            | Operation::CreateOrder
            | Operation::DeleteOrder
            | Operation::InitiatePayment
            | Operation::VerifyPayment => Access::Authenticated,

            Operation::UpdateProduct
            | Operation::DeleteProduct
            | Operation::UpdateOrderStatus
            | Operation::DashboardStats
            | Operation::ProductAnalytics
            | Operation::ListUsers
            | Operation::ManageUser
            | Operation::ListAllOrders
            | Operation::AdminConfig => Access::Admin,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Register => "register",
            Operation::Login => "login",
            Operation::RefreshToken => "refresh_token",
            Operation::ListProducts => "list_products",
            Operation::RetrieveProduct => "retrieve_product",
            Operation::CreateProduct => "create_product",
            Operation::UpdateProduct => "update_product",
            Operation::DeleteProduct => "delete_product",
            Operation::ListOrders => "list_orders",
            Operation::RetrieveOrder => "retrieve_order",
            Operation::CreateOrder => "create_order",
            Operation::DeleteOrder => "delete_order",
            Operation::UpdateOrderStatus => "update_order_status",
            Operation::InitiatePayment => "initiate_payment",
            Operation::VerifyPayment => "verify_payment",
            Operation::DashboardStats => "dashboard_stats",
            Operation::ProductAnalytics => "product_analytics",
            Operation::ListUsers => "list_users",
            Operation::ManageUser => "manage_user",
            Operation::ListAllOrders => "list_all_orders",
            Operation::AdminConfig => "admin_config",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated caller, resolved from a valid access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub username: String,
    pub is_admin: bool,
}

/// Checks whether `caller` may perform `op`.
///
/// An anonymous caller hitting a protected operation gets
/// [`AuthError::Unauthenticated`]; a logged-in non-admin hitting an admin
/// operation gets [`AuthError::Forbidden`].
pub fn authorize(op: Operation, caller: Option<&Principal>) -> Result<(), AuthError> {
    match (op.required_access(), caller) {
        (Access::Anyone, _) => Ok(()),
        (_, None) => Err(AuthError::Unauthenticated),
        (Access::Authenticated, Some(_)) => Ok(()),
        (Access::Admin, Some(p)) if p.is_admin => Ok(()),
        (Access::Admin, Some(_)) => Err(AuthError::Forbidden(op)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(is_admin: bool) -> Principal {
        Principal {
            user_id: UserId::new(1),
            username: "asha".to_string(),
            is_admin,
        }
    }

    #[test]
    fn test_public_operations_allow_anonymous() {
        for op in [Operation::Register, Operation::Login, Operation::ListProducts] {
            assert_eq!(authorize(op, None), Ok(()));
        }
    }

    #[test]
    fn test_anonymous_is_unauthenticated_for_protected_operations() {
        for op in Operation::ALL {
            if op.required_access() != Access::Anyone {
                assert_eq!(authorize(op, None), Err(AuthError::Unauthenticated), "{op}");
            }
        }
    }

    #[test]
    fn test_customer_is_forbidden_from_admin_operations() {
        let customer = principal(false);
        assert_eq!(authorize(Operation::CreateOrder, Some(&customer)), Ok(()));
        assert_eq!(
            authorize(Operation::DashboardStats, Some(&customer)),
            Err(AuthError::Forbidden(Operation::DashboardStats))
        );
        assert_eq!(
            authorize(Operation::UpdateOrderStatus, Some(&customer)),
            Err(AuthError::Forbidden(Operation::UpdateOrderStatus))
        );
    }

    #[test]
    fn test_admin_can_do_everything() {
        let admin = principal(true);
        for op in Operation::ALL {
            assert_eq!(authorize(op, Some(&admin)), Ok(()), "{op}");
        }
    }

    #[test]
    fn test_operation_names_are_unique() {
        let mut names: Vec<_> = Operation::ALL.iter().map(|op| op.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Operation::ALL.len());
    }
}
