//! Notification messages rendered as Telegram HTML.

use std::fmt::Write as _;

use rust_decimal::Decimal;

use uephone_core::{
    OfferId, OfferStatus, OfferTerms, OrderId, PaymentMethod, ResolvedBy, round_money,
};

use crate::models::order::ShippingAddress;

/// Escape text for Telegram's HTML parse mode.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// One item line in a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationLine {
    pub name: String,
    pub quantity: i32,
    /// Units an accepted offer was made for. Shown as `quantity/offered`
    /// when the customer changed the line since.
    pub offered_quantity: Option<i32>,
    pub unit_price: Decimal,
}

/// Render items as `- {name} (x{qty}) - ${line_total}`, one per line.
#[must_use]
pub fn format_cart_items(lines: &[NotificationLine]) -> String {
    if lines.is_empty() {
        return "No items".to_string();
    }

    lines
        .iter()
        .map(|line| {
            let quantity = match line.offered_quantity {
                Some(offered) if offered != line.quantity => {
                    format!("{}/{offered}", line.quantity)
                }
                _ => line.quantity.to_string(),
            };
            let total = round_money(line.unit_price * Decimal::from(line.quantity));
            format!("- {} (x{quantity}) - ${total:.2}", escape_html(&line.name))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Events the store announces on Telegram.
#[derive(Debug, Clone)]
pub enum Notification {
    CartItemAdded {
        customer_email: String,
        product: String,
        quantity: i32,
        unit_price: Decimal,
    },
    OfferSubmitted {
        offer_id: OfferId,
        customer_email: String,
        product: String,
        terms: OfferTerms,
    },
    OfferResolved {
        offer_id: OfferId,
        customer_email: String,
        product: String,
        terms: OfferTerms,
        status: OfferStatus,
        resolved_by: ResolvedBy,
    },
    OrderPlaced {
        order_id: OrderId,
        customer_email: String,
        lines: Vec<NotificationLine>,
        subtotal: Decimal,
        shipping: Decimal,
        total: Decimal,
        shipping_address: Option<ShippingAddress>,
    },
    PaymentConfirmed {
        order_id: OrderId,
        amount: Decimal,
        payment_method: PaymentMethod,
        tracking_number: String,
    },
    ChatMessage {
        conversation_id: String,
        username: Option<String>,
        email: Option<String>,
        message: String,
    },
    ContactRequest {
        name: String,
        email: String,
        phone: Option<String>,
        subject: Option<String>,
        message: String,
    },
}

impl Notification {
    /// Short name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::CartItemAdded { .. } => "cart_item_added",
            Self::OfferSubmitted { .. } => "offer_submitted",
            Self::OfferResolved { .. } => "offer_resolved",
            Self::OrderPlaced { .. } => "order_placed",
            Self::PaymentConfirmed { .. } => "payment_confirmed",
            Self::ChatMessage { .. } => "chat_message",
            Self::ContactRequest { .. } => "contact_request",
        }
    }

    /// Render the Telegram HTML body. User-supplied text is escaped.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::CartItemAdded {
                customer_email,
                product,
                quantity,
                unit_price,
            } => format!(
                "🛒 <b>Product Added to Cart</b>\n\n<b>User:</b> {}\n<b>Product:</b> {}\n<b>Quantity:</b> {quantity}\n<b>Price:</b> ${unit_price:.2}",
                escape_html(customer_email),
                escape_html(product),
            ),
            Self::OfferSubmitted {
                offer_id,
                customer_email,
                product,
                terms,
            } => format!(
                "💰 <b>New Offer</b> #{offer_id}\n\n<b>User:</b> {}\n<b>Product:</b> {}\n{}",
                escape_html(customer_email),
                escape_html(product),
                offer_details(terms),
            ),
            Self::OfferResolved {
                offer_id,
                customer_email,
                product,
                terms,
                status,
                resolved_by,
            } => {
                let heading = match status {
                    OfferStatus::Accepted => "✅ <b>Offer Accepted</b>",
                    OfferStatus::Rejected => "❌ <b>Offer Rejected</b>",
                    OfferStatus::Expired => "⌛ <b>Offer Expired</b>",
                    OfferStatus::Pending => "⏳ <b>Offer Pending</b>",
                };
                format!(
                    "{heading} #{offer_id}\n\n<b>User:</b> {}\n<b>Product:</b> {}\n{}\n<b>Decided by:</b> {resolved_by}",
                    escape_html(customer_email),
                    escape_html(product),
                    offer_details(terms),
                )
            }
            Self::OrderPlaced {
                order_id,
                customer_email,
                lines,
                subtotal,
                shipping,
                total,
                shipping_address,
            } => {
                let mut text = format!(
                    "📦 <b>New Order</b> #{order_id}\n\n<b>User:</b> {}\n<b>Items:</b>\n{}\n\n<b>Subtotal:</b> ${subtotal:.2}\n<b>Shipping:</b> ${shipping:.2}\n<b>Total:</b> ${total:.2}",
                    escape_html(customer_email),
                    format_cart_items(lines),
                );
                if let Some(address) = shipping_address {
                    let _ = write!(
                        text,
                        "\n<b>Ship to:</b> {}",
                        escape_html(&format_address(address))
                    );
                }
                text
            }
            Self::PaymentConfirmed {
                order_id,
                amount,
                payment_method,
                tracking_number,
            } => format!(
                "💳 <b>Payment Confirmed</b>\n\n<b>Order:</b> #{order_id}\n<b>Amount:</b> ${amount:.2}\n<b>Method:</b> {}\n<b>Tracking:</b> {tracking_number}",
                payment_method.display_name(),
            ),
            Self::ChatMessage {
                conversation_id,
                username,
                email,
                message,
            } => format!(
                "💬 <b>New Chat Message</b>\n\n<b>From:</b> {}\n<b>Email:</b> {}\n<b>Conversation:</b> {}\n\n{}",
                escape_html(username.as_deref().unwrap_or("Guest")),
                escape_html(email.as_deref().unwrap_or("-")),
                escape_html(conversation_id),
                escape_html(message),
            ),
            Self::ContactRequest {
                name,
                email,
                phone,
                subject,
                message,
            } => {
                let mut text = format!(
                    "📨 <b>Contact Request</b>\n\n<b>Name:</b> {}\n<b>Email:</b> {}",
                    escape_html(name),
                    escape_html(email),
                );
                if let Some(phone) = phone {
                    let _ = write!(text, "\n<b>Phone:</b> {}", escape_html(phone));
                }
                if let Some(subject) = subject {
                    let _ = write!(text, "\n<b>Subject:</b> {}", escape_html(subject));
                }
                let _ = write!(text, "\n\n{}", escape_html(message));
                text
            }
        }
    }
}

fn offer_details(terms: &OfferTerms) -> String {
    format!(
        "<b>Quantity:</b> {}\n<b>List price:</b> ${:.2}\n<b>Offer price:</b> ${:.2}\n<b>Offer total:</b> ${:.2}\n<b>Savings:</b> ${:.2} ({:.1}%)",
        terms.quantity,
        terms.list_price,
        terms.offer_price,
        terms.offer_total(),
        terms.savings(),
        terms.savings_percent(),
    )
}

fn format_address(address: &ShippingAddress) -> String {
    [
        address.street_address.as_str(),
        address.town.as_str(),
        address.region.as_str(),
        address.zip_code.as_str(),
        address.country.as_str(),
    ]
    .into_iter()
    .map(str::trim)
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, quantity: i32, offered: Option<i32>, price: i64) -> NotificationLine {
        NotificationLine {
            name: name.to_string(),
            quantity,
            offered_quantity: offered,
            unit_price: Decimal::from(price),
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<script>&co</script>"),
            "&lt;script&gt;&amp;co&lt;/script&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_format_cart_items_empty() {
        assert_eq!(format_cart_items(&[]), "No items");
    }

    #[test]
    fn test_format_cart_items_lines() {
        let text = format_cart_items(&[
            line("iPhone 12", 3, None, 250),
            line("Pixel <7>", 2, Some(5), 199),
        ]);
        assert_eq!(
            text,
            "- iPhone 12 (x3) - $750.00\n- Pixel &lt;7&gt; (x2/5) - $398.00"
        );
    }

    #[test]
    fn test_format_cart_items_same_offered_quantity_is_plain() {
        assert_eq!(
            format_cart_items(&[line("S21", 4, Some(4), 100)]),
            "- S21 (x4) - $400.00"
        );
    }

    #[test]
    fn test_cart_item_added_message() {
        let text = Notification::CartItemAdded {
            customer_email: "buyer@shop.ng".to_string(),
            product: "iPhone 13 Pro".to_string(),
            quantity: 5,
            unit_price: Decimal::new(42_550, 2),
        }
        .render();

        assert_eq!(
            text,
            "🛒 <b>Product Added to Cart</b>\n\n<b>User:</b> buyer@shop.ng\n<b>Product:</b> iPhone 13 Pro\n<b>Quantity:</b> 5\n<b>Price:</b> $425.50"
        );
    }

    #[test]
    fn test_offer_messages_include_savings() {
        let terms = OfferTerms::new(Decimal::from(300), Decimal::from(270), 10);
        let submitted = Notification::OfferSubmitted {
            offer_id: OfferId::new(8),
            customer_email: "b@x.io".to_string(),
            product: "Galaxy S22".to_string(),
            terms,
        }
        .render();
        assert!(submitted.starts_with("💰 <b>New Offer</b> #8"));
        assert!(submitted.contains("<b>Savings:</b> $300.00 (10.0%)"));

        let resolved = Notification::OfferResolved {
            offer_id: OfferId::new(8),
            customer_email: "b@x.io".to_string(),
            product: "Galaxy S22".to_string(),
            terms,
            status: OfferStatus::Accepted,
            resolved_by: ResolvedBy::Auto,
        }
        .render();
        assert!(resolved.starts_with("✅ <b>Offer Accepted</b> #8"));
        assert!(resolved.ends_with("<b>Decided by:</b> auto"));
    }

    #[test]
    fn test_chat_message_escapes_user_text() {
        let text = Notification::ChatMessage {
            conversation_id: "conv_1".to_string(),
            username: None,
            email: Some("a<b>@x.io".to_string()),
            message: "<i>hi</i>".to_string(),
        }
        .render();

        assert!(text.contains("<b>From:</b> Guest"));
        assert!(text.contains("a&lt;b&gt;@x.io"));
        assert!(text.ends_with("&lt;i&gt;hi&lt;/i&gt;"));
    }

    #[test]
    fn test_order_placed_lists_items_and_address() {
        let text = Notification::OrderPlaced {
            order_id: OrderId::new(12),
            customer_email: "b@x.io".to_string(),
            lines: vec![line("iPhone 11", 5, None, 180)],
            subtotal: Decimal::from(900),
            shipping: Decimal::from(25),
            total: Decimal::from(925),
            shipping_address: Some(ShippingAddress {
                country: "Ghana".to_string(),
                town: "Accra".to_string(),
                street_address: "5 Ring Rd".to_string(),
                ..Default::default()
            }),
        }
        .render();

        assert!(text.contains("- iPhone 11 (x5) - $900.00"));
        assert!(text.contains("<b>Total:</b> $925.00"));
        assert!(text.ends_with("<b>Ship to:</b> 5 Ring Rd, Accra, Ghana"));
    }

    #[test]
    fn test_contact_request_skips_missing_fields() {
        let text = Notification::ContactRequest {
            name: "Tunde".to_string(),
            email: "t@x.io".to_string(),
            phone: None,
            subject: Some("Bulk order".to_string()),
            message: "Need 200 units".to_string(),
        }
        .render();

        assert!(!text.contains("Phone"));
        assert!(text.contains("<b>Subject:</b> Bulk order"));
        assert!(text.ends_with("\n\nNeed 200 units"));
    }
}
