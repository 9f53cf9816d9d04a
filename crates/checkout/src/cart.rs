//! Cart mutation service.
//!
//! All mutations to one user's cart are serialized behind a per-user async
//! lock, so merge-on-add and replace-on-add are atomic; carts of different
//! users proceed fully in parallel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use common::{LineId, ProductId, UserId};
use domain::{Cart, DomainError, Principal, Product, auth};
use store::MarketStore;

use crate::clock::Clock;

/// Mutates per-user carts with merge-on-add semantics.
pub struct CartService<S, C>
where
    S: MarketStore,
    C: Clock,
{
    store: S,
    clock: C,
    locks: Mutex<HashMap<UserId, Arc<tokio::sync::Mutex<()>>>>,
}

impl<S, C> CartService<S, C>
where
    S: MarketStore,
    C: Clock,
{
    /// Creates a new cart service.
    pub fn new(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn user_lock(&self, user_id: UserId) -> Arc<tokio::sync::Mutex<()>> {
        self.locks
            .lock()
            .unwrap()
            .entry(user_id)
            .or_default()
            .clone()
    }

    /// Adds `quantity` units of a product to the caller's cart, merging
    /// into an existing line for the same product.
    ///
    /// The merged quantity must not exceed current stock (`ExceedsStock`);
    /// the requested delta alone must be available and in stock
    /// (`ProductUnavailable` / `InsufficientStock`). Creates the cart on
    /// first use.
    #[tracing::instrument(skip(self), fields(user_id = %principal.user_id, %product_id))]
    pub async fn add_item(
        &self,
        principal: &Principal,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, DomainError> {
        auth::manage_cart(principal)?;
        if quantity == 0 {
            return Err(DomainError::Validation(
                "quantity must be at least 1".to_string(),
            ));
        }

        let lock = self.user_lock(principal.user_id);
        let _guard = lock.lock().await;

        let product = self
            .get_product(product_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "product",
                id: product_id.to_string(),
            })?;
        if !product.is_available() {
            return Err(DomainError::ProductUnavailable {
                name: product.name().to_string(),
            });
        }
        if quantity > product.stock() {
            return Err(DomainError::InsufficientStock {
                name: product.name().to_string(),
                requested: quantity,
                available: product.stock(),
            });
        }

        let mut cart = match self.load_cart(principal.user_id).await? {
            Some(cart) => cart,
            None => Cart::new(principal.user_id, self.clock.now()),
        };

        let merged = cart.merged_quantity(product_id, quantity);
        if merged > product.stock() {
            return Err(DomainError::ExceedsStock {
                name: product.name().to_string(),
                requested: merged,
                available: product.stock(),
            });
        }

        cart.add(product_id, quantity);
        cart.touch(self.clock.now());
        self.save_cart(&cart).await?;
        Ok(cart)
    }

    /// Sets a line's quantity; zero removes the line. The new quantity must
    /// not exceed current stock.
    #[tracing::instrument(skip(self), fields(user_id = %principal.user_id, %line_id))]
    pub async fn update_quantity(
        &self,
        principal: &Principal,
        line_id: LineId,
        quantity: u32,
    ) -> Result<Cart, DomainError> {
        auth::manage_cart(principal)?;

        let lock = self.user_lock(principal.user_id);
        let _guard = lock.lock().await;

        let mut cart = self.require_cart(principal.user_id).await?;
        let product_id = cart
            .line(line_id)
            .ok_or(DomainError::NotFound {
                entity: "cart item",
                id: line_id.to_string(),
            })?
            .product_id;

        if quantity > 0 {
            let product = self
                .get_product(product_id)
                .await?
                .ok_or(DomainError::NotFound {
                    entity: "product",
                    id: product_id.to_string(),
                })?;
            if quantity > product.stock() {
                return Err(DomainError::ExceedsStock {
                    name: product.name().to_string(),
                    requested: quantity,
                    available: product.stock(),
                });
            }
        }

        cart.set_quantity(line_id, quantity)?;
        cart.touch(self.clock.now());
        self.save_cart(&cart).await?;
        Ok(cart)
    }

    /// Removes a line from the caller's cart. Fails `NotFound` for a
    /// missing or foreign line.
    #[tracing::instrument(skip(self), fields(user_id = %principal.user_id, %line_id))]
    pub async fn remove_item(
        &self,
        principal: &Principal,
        line_id: LineId,
    ) -> Result<Cart, DomainError> {
        auth::manage_cart(principal)?;

        let lock = self.user_lock(principal.user_id);
        let _guard = lock.lock().await;

        let mut cart = self.require_cart(principal.user_id).await?;
        cart.remove(line_id)?;
        cart.touch(self.clock.now());
        self.save_cart(&cart).await?;
        Ok(cart)
    }

    /// Deletes every line of the caller's cart. Succeeds on an empty cart.
    #[tracing::instrument(skip(self), fields(user_id = %principal.user_id))]
    pub async fn clear(&self, principal: &Principal) -> Result<(), DomainError> {
        auth::manage_cart(principal)?;

        let lock = self.user_lock(principal.user_id);
        let _guard = lock.lock().await;

        let cart = self.require_cart(principal.user_id).await?;
        self.store.delete_cart_lines(cart.id()).await.map_err(|err| {
            tracing::error!(error = %err, user_id = %principal.user_id, "store failure clearing cart");
            DomainError::Internal
        })
    }

    /// Returns the caller's cart, creating an empty one on first read.
    #[tracing::instrument(skip(self), fields(user_id = %principal.user_id))]
    pub async fn get_cart(&self, principal: &Principal) -> Result<Cart, DomainError> {
        auth::manage_cart(principal)?;

        let lock = self.user_lock(principal.user_id);
        let _guard = lock.lock().await;

        match self.load_cart(principal.user_id).await? {
            Some(cart) => Ok(cart),
            None => {
                let cart = Cart::new(principal.user_id, self.clock.now());
                self.save_cart(&cart).await?;
                Ok(cart)
            }
        }
    }

    async fn get_product(
        &self,
        product_id: ProductId,
    ) -> Result<Option<Product>, DomainError> {
        self.store.get_product(product_id).await.map_err(|err| {
            tracing::error!(error = %err, %product_id, "store failure resolving product");
            DomainError::Internal
        })
    }

    async fn load_cart(&self, user_id: UserId) -> Result<Option<Cart>, DomainError> {
        self.store.get_cart(user_id).await.map_err(|err| {
            tracing::error!(error = %err, %user_id, "store failure loading cart");
            DomainError::Internal
        })
    }

    async fn require_cart(&self, user_id: UserId) -> Result<Cart, DomainError> {
        self.load_cart(user_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "cart",
                id: user_id.to_string(),
            })
    }

    async fn save_cart(&self, cart: &Cart) -> Result<(), DomainError> {
        self.store.save_cart(cart.clone()).await.map_err(|err| {
            tracing::error!(error = %err, cart_id = %cart.id(), "store failure saving cart");
            DomainError::Internal
        })
    }
}
