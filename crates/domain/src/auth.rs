//! Principals, roles, and per-operation authorization predicates.
//!
//! Role and ownership checks are consolidated here as one predicate per
//! exposed operation, so they can be tested without a store and the
//! services never compare roles inline.

use common::UserId;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::order::Order;

/// Role carried by an authenticated principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// A buyer.
    User,

    /// A seller.
    Seller,

    /// An administrator.
    Admin,
}

/// An authenticated caller, as supplied by the identity provider.
///
/// The engine trusts this value; it enforces role and ownership checks
/// itself but never authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
}

impl Principal {
    /// Creates a principal with the given role.
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// A buyer principal.
    pub fn user(user_id: UserId) -> Self {
        Self::new(user_id, Role::User)
    }

    /// A seller principal.
    pub fn seller(user_id: UserId) -> Self {
        Self::new(user_id, Role::Seller)
    }
}

/// Only buyers place orders.
pub fn place_order(principal: &Principal) -> Result<(), DomainError> {
    if principal.role != Role::User {
        return Err(DomainError::Unauthorized("only users can place orders"));
    }
    Ok(())
}

/// Only buyers own and mutate carts.
pub fn manage_cart(principal: &Principal) -> Result<(), DomainError> {
    if principal.role != Role::User {
        return Err(DomainError::Unauthorized("only users can manage a cart"));
    }
    Ok(())
}

/// Only buyers list their own orders.
pub fn view_own_orders(principal: &Principal) -> Result<(), DomainError> {
    if principal.role != Role::User {
        return Err(DomainError::Unauthorized("only users have order history"));
    }
    Ok(())
}

/// Seller-side queries require the seller role.
pub fn seller_query(principal: &Principal) -> Result<(), DomainError> {
    if principal.role != Role::Seller {
        return Err(DomainError::Unauthorized("user is not a seller"));
    }
    Ok(())
}

/// A buyer may view an order only if they placed it.
pub fn view_order_as_buyer(principal: &Principal, order: &Order) -> Result<(), DomainError> {
    view_own_orders(principal)?;
    if order.user_id() != principal.user_id {
        return Err(DomainError::Unauthorized(
            "order does not belong to this user",
        ));
    }
    Ok(())
}

/// A seller may view an order only if it contains at least one of their
/// lines.
pub fn view_order_as_seller(principal: &Principal, order: &Order) -> Result<(), DomainError> {
    seller_query(principal)?;
    if !order.contains_seller(principal.user_id) {
        return Err(DomainError::Unauthorized(
            "order contains no items from this seller",
        ));
    }
    Ok(())
}

/// A seller may transition an order's status only if it contains at least
/// one of their lines.
pub fn update_order_status(principal: &Principal, order: &Order) -> Result<(), DomainError> {
    seller_query(principal)?;
    if !order.contains_seller(principal.user_id) {
        return Err(DomainError::Unauthorized(
            "order contains no items from this seller",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{OrderLine, PaymentMethod};
    use chrono::Utc;
    use common::{Money, OrderId, ProductId};

    fn order_sold_by(seller_id: UserId) -> Order {
        Order::new(
            OrderId::new(),
            UserId::new(),
            vec![OrderLine::new(
                ProductId::new(),
                seller_id,
                1,
                Money::from_cents(500),
            )],
            "12 Main Street",
            PaymentMethod::CashOnDelivery,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn only_users_place_orders() {
        assert!(place_order(&Principal::user(UserId::new())).is_ok());
        assert!(matches!(
            place_order(&Principal::seller(UserId::new())),
            Err(DomainError::Unauthorized(_))
        ));
        assert!(matches!(
            place_order(&Principal::new(UserId::new(), Role::Admin)),
            Err(DomainError::Unauthorized(_))
        ));
    }

    #[test]
    fn only_users_manage_carts() {
        assert!(manage_cart(&Principal::user(UserId::new())).is_ok());
        assert!(manage_cart(&Principal::seller(UserId::new())).is_err());
    }

    #[test]
    fn seller_query_requires_seller_role() {
        assert!(seller_query(&Principal::seller(UserId::new())).is_ok());
        assert!(seller_query(&Principal::user(UserId::new())).is_err());
    }

    #[test]
    fn buyer_views_only_their_own_order() {
        let order = order_sold_by(UserId::new());
        let owner = Principal::user(order.user_id());
        let stranger = Principal::user(UserId::new());

        assert!(view_order_as_buyer(&owner, &order).is_ok());
        assert!(matches!(
            view_order_as_buyer(&stranger, &order),
            Err(DomainError::Unauthorized(_))
        ));
    }

    #[test]
    fn status_update_requires_involvement() {
        let seller_id = UserId::new();
        let order = order_sold_by(seller_id);

        assert!(update_order_status(&Principal::seller(seller_id), &order).is_ok());
        assert!(matches!(
            update_order_status(&Principal::seller(UserId::new()), &order),
            Err(DomainError::Unauthorized(_))
        ));
        assert!(matches!(
            update_order_status(&Principal::user(order.user_id()), &order),
            Err(DomainError::Unauthorized(_))
        ));
    }
}
