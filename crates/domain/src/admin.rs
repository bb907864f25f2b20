//! Static back-office configuration: which columns the admin lists show, what
//! they filter and search on, and which fields are editable.

use serde::Serialize;

/// A field exposed by an admin screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldConfig {
    pub name: &'static str,
    pub label: &'static str,
}

/// Child rows edited inline on the parent's detail page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InlineAdmin {
    pub model: &'static str,
    pub raw_id_fields: &'static [&'static str],
    pub readonly_fields: &'static [&'static str],
    pub extra: u32,
}

/// Admin configuration for one model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelAdmin {
    pub model: &'static str,
    pub list_display: &'static [FieldConfig],
    pub list_filter: &'static [&'static str],
    pub search_fields: &'static [&'static str],
    pub readonly_fields: &'static [&'static str],
    pub list_editable: &'static [&'static str],
    pub inlines: &'static [InlineAdmin],
}

const fn field(name: &'static str, label: &'static str) -> FieldConfig {
    FieldConfig { name, label }
}

pub const PRODUCT_ADMIN: ModelAdmin = ModelAdmin {
    model: "product",
    list_display: &[
        field("name", "Name"),
        field("price", "Price"),
        field("stock", "Stock"),
        field("created_at", "Created at"),
    ],
    list_filter: &["created_at"],
    search_fields: &["name", "description"],
    readonly_fields: &[],
    list_editable: &[],
    inlines: &[],
};

pub const ORDER_ITEM_INLINE: InlineAdmin = InlineAdmin {
    model: "order_item",
    raw_id_fields: &["product"],
    readonly_fields: &["price"],
    extra: 0,
};

pub const ORDER_ADMIN: ModelAdmin = ModelAdmin {
    model: "order",
    list_display: &[
        field("id", "ID"),
        field("customer", "Customer"),
        field("status", "Status"),
        field("total_price", "Total price"),
        field("created_at", "Created at"),
    ],
    list_filter: &["status", "created_at"],
    search_fields: &["id", "customer__username"],
    readonly_fields: &["created_at", "razorpay_order_id", "razorpay_payment_id"],
    list_editable: &["status", "customer", "total_price"],
    inlines: &[ORDER_ITEM_INLINE],
};

/// Looks up the configuration for a model by name.
pub fn model_admin(model: &str) -> Option<&'static ModelAdmin> {
    match model {
        "product" => Some(&PRODUCT_ADMIN),
        "order" => Some(&ORDER_ADMIN),
        _ => None,
    }
}
