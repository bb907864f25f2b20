use std::collections::HashMap;

use common::{Money, ProductId, UserId};
use store::{NewOrder, NewOrderItem, Product};

use super::{OrderError, OrderLine};

/// Flat shipping surcharge added once to every order with a positive subtotal.
pub const SHIPPING_CHARGE: Money = Money::from_major(40);

/// Validates requested lines against current stock and prices them.
///
/// Lines are checked in request order and the first failing line aborts the
/// whole order. Each line's price is the product's current price; the total
/// is the sum of line totals plus [`SHIPPING_CHARGE`] when that sum is
/// positive. Stock is only compared here, never reserved.
pub fn price_order(
    customer_id: UserId,
    lines: &[OrderLine],
    products: &HashMap<ProductId, Product>,
) -> Result<NewOrder, OrderError> {
    let mut items = Vec::with_capacity(lines.len());
    let mut subtotal = Money::zero();

    for line in lines {
        if line.quantity == 0 {
            return Err(OrderError::InvalidQuantity {
                product_id: line.product_id,
            });
        }

        let product = products
            .get(&line.product_id)
            .ok_or(OrderError::ProductNotFound(line.product_id))?;

        if i64::from(line.quantity) > product.stock {
            return Err(OrderError::InsufficientStock {
                product_id: product.id,
                product_name: product.name.clone(),
                available: product.stock,
            });
        }

        subtotal = product
            .price
            .checked_multiply(line.quantity)
            .and_then(|line_total| subtotal.checked_add(line_total))
            .ok_or(OrderError::TotalOverflow)?;
        items.push(NewOrderItem {
            product_id: product.id,
            quantity: line.quantity,
            price: product.price,
        });
    }

    let total_price = if subtotal.is_positive() {
        subtotal
            .checked_add(SHIPPING_CHARGE)
            .ok_or(OrderError::TotalOverflow)?
    } else {
        subtotal
    };

    Ok(NewOrder {
        customer_id,
        total_price,
        items,
    })
}
