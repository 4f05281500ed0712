//! Integration tests for the aggregate fetchers.
//!
//! Every test wires the router to in-memory repositories seeded with a small
//! store: one order with two taxed lines, a return, a swap and a claim.

use chrono::{TimeZone, Utc};
use domain::{
    Cart, Claim, Discount, DiscountRuleType, GiftCard, LineItem, Order, Product, ProductVariant,
    Region, ReturnItem, ReturnRequest, ShippingMethod, Store, Swap, TaxLine,
};
use enrichment::{
    AggregateSources, EntityEventData, EventRouter, InMemorySources, NotificationEvent,
    TemplateContext,
};
use serde_json::{Value, json};

fn item_1() -> LineItem {
    LineItem::new("item_1", "Shirt", 500, 2)
        .with_tax_line(TaxLine::new("vat", 10.0))
        .with_adjustment(200)
        .with_variant("var_shirt")
}

fn item_2() -> LineItem {
    let mut item = LineItem::new("item_2", "Socks", 500, 1).with_tax_line(TaxLine::new("vat", 10.0));
    item.thumbnail = Some("//cdn.example.com/socks.png".into());
    item
}

fn order() -> Order {
    let mut order = Order::new("order_1", "buyer@example.com", "usd");
    order.cart_id = Some("cart_1".into());
    order.created_at = Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap();
    order.items = vec![item_1(), item_2()];
    order.discounts = vec![Discount::new("disc_1", "TEN", DiscountRuleType::Percentage, 10)];
    order.gift_cards = vec![GiftCard {
        id: "gc_applied".into(),
        code: "GIFT".into(),
        value: 1000,
        ..Default::default()
    }];
    order.subtotal = 1500;
    order.shipping_total = 1000;
    order.total = 2430;
    order
}

fn shopping_cart() -> Cart {
    let mut cart = Cart {
        id: "cart_1".into(),
        ..Default::default()
    };
    cart.context.insert("locale".into(), json!("de-DE"));
    cart
}

fn return_request() -> ReturnRequest {
    ReturnRequest {
        id: "ret_1".into(),
        order_id: Some("order_1".into()),
        items: vec![ReturnItem {
            item_id: "item_1".into(),
            quantity: 1,
            ..Default::default()
        }],
        shipping_method: Some(ShippingMethod {
            id: "sm_ret".into(),
            price: 1000,
            tax_lines: vec![TaxLine::new("vat", 10.0), TaxLine::new("city", 5.0)],
            ..Default::default()
        }),
        refund_amount: 880,
        updated_at: Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap(),
        ..Default::default()
    }
}

fn new_line() -> LineItem {
    LineItem::new("line_new", "Hoodie", 1500, 1).with_tax_line(TaxLine::new("vat", 10.0))
}

fn swap_cart() -> Cart {
    Cart {
        id: "cart_swap".into(),
        items: vec![
            new_line(),
            LineItem::new("line_ret", "Shirt", 500, 1)
                .with_tax_line(TaxLine::new("vat", 10.0))
                .with_variant("var_shirt")
                .returned(),
        ],
        tax_total: Some(160),
        total: Some(1100),
        ..Default::default()
    }
}

fn swap() -> Swap {
    Swap {
        id: "swap_1".into(),
        order_id: "order_1".into(),
        cart_id: Some("cart_swap".into()),
        difference_due: 1100,
        additional_items: vec![new_line()],
        return_order: Some(return_request()),
        shipping_methods: vec![ShippingMethod {
            id: "sm_swap".into(),
            price: 500,
            tax_lines: vec![TaxLine::new("vat", 10.0)],
            ..Default::default()
        }],
        updated_at: Utc.with_ymd_and_hms(2024, 4, 2, 9, 0, 0).unwrap(),
        ..Default::default()
    }
}

async fn seeded() -> (EventRouter, InMemorySources) {
    let memory = InMemorySources::default();
    memory.orders.insert(order()).await;
    memory.line_items.insert(item_1()).await;
    memory.line_items.insert(item_2()).await;
    memory.carts.insert(shopping_cart()).await;
    memory.carts.insert(swap_cart()).await;
    memory.returns.insert(return_request()).await;
    memory.swaps.insert(swap()).await;
    memory
        .store
        .set(Store {
            id: "store".into(),
            name: "Shop".into(),
            swap_link_template: Some("https://shop.example/swap/{cart_id}".into()),
        })
        .await;

    let router = EventRouter::new(AggregateSources::from_memory(&memory));
    (router, memory)
}

async fn dispatch(router: &EventRouter, name: &str, payload: Value) -> TemplateContext {
    router.dispatch_raw(name, payload).await.unwrap()
}

fn field<'a>(context: &'a TemplateContext, path: &str) -> &'a Value {
    let mut value = context
        .get(path.split('.').next().unwrap())
        .unwrap_or(&Value::Null);
    for segment in path.split('.').skip(1) {
        value = match segment.parse::<usize>() {
            Ok(index) => &value[index],
            Err(_) => &value[segment],
        };
    }
    value
}

mod order_placed {
    use super::*;

    #[tokio::test]
    async fn aggregates_are_tax_inclusive() {
        let (router, _) = seeded().await;
        let context = dispatch(&router, "order.placed", json!({"id": "order_1"})).await;

        assert_eq!(field(&context, "subtotal"), "16.50 USD");
        assert_eq!(field(&context, "discount_total"), "2.20 USD");
        assert_eq!(field(&context, "discounted_subtotal"), 1430);
        assert_eq!(field(&context, "subtotal_ex_tax"), "15.00 USD");
        assert_eq!(field(&context, "tax_total"), "0.00 USD");
        assert_eq!(field(&context, "shipping_total"), "10.00 USD");
        assert_eq!(field(&context, "total"), "24.30 USD");
    }

    #[tokio::test]
    async fn items_are_priced_per_unit() {
        let (router, _) = seeded().await;
        let context = dispatch(&router, "order.placed", json!({"id": "order_1"})).await;

        assert_eq!(field(&context, "items.0.price"), "5.50 USD");
        assert_eq!(field(&context, "items.0.discounted_price"), "4.40 USD");
        assert_eq!(field(&context, "items.0.totals.total"), 880);
        assert_eq!(
            field(&context, "items.1.thumbnail"),
            "https://cdn.example.com/socks.png"
        );
    }

    #[tokio::test]
    async fn discounts_and_header_fields() {
        let (router, _) = seeded().await;
        let context = dispatch(&router, "order.placed", json!({"id": "order_1"})).await;

        assert_eq!(context.email(), Some("buyer@example.com"));
        assert_eq!(field(&context, "locale"), "de-DE");
        assert_eq!(field(&context, "date"), "Tue Mar 05 2024");
        assert_eq!(field(&context, "has_discounts"), 1);
        assert_eq!(field(&context, "has_gift_cards"), 1);

        let discounts = field(&context, "discounts").as_array().unwrap();
        assert_eq!(discounts.len(), 1);
        assert_eq!(discounts[0]["descriptor"], "10%");
        assert_eq!(discounts[0]["is_giftcard"], false);
        assert_eq!(discounts[0]["code"], "TEN");
    }

    #[tokio::test]
    async fn requests_order_relations() {
        let (router, memory) = seeded().await;
        dispatch(&router, "order.placed", json!({"id": "order_1"})).await;

        let requests = memory.orders.requests().await;
        assert!(requests[0].has_relation("discounts.rule"));
        assert!(requests[0].has_relation("gift_cards"));
    }

    #[tokio::test]
    async fn unavailable_cart_leaves_locale_empty() {
        let (router, memory) = seeded().await;
        memory.carts.set_unavailable(true).await;

        let context = dispatch(&router, "order.placed", json!({"id": "order_1"})).await;

        assert_eq!(field(&context, "locale"), &Value::Null);
        assert_eq!(field(&context, "total"), "24.30 USD");
    }

    #[tokio::test]
    async fn zero_decimal_currency() {
        let (router, memory) = seeded().await;
        let mut order = order();
        order.id = "order_jpy".into();
        order.currency_code = "jpy".into();
        memory.orders.insert(order).await;

        let context = dispatch(&router, "order.placed", json!({"id": "order_jpy"})).await;

        assert_eq!(field(&context, "total"), "2430 JPY");
        assert_eq!(field(&context, "tax_total"), "0 JPY");
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let (router, _) = seeded().await;
        let err = router
            .dispatch_raw("order.placed", json!({"id": "missing"}))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}

mod order_canceled {
    use super::*;

    #[tokio::test]
    async fn stored_totals_scaled_by_order_rate() {
        let (router, memory) = seeded().await;
        let mut order = order();
        order.id = "order_taxed".into();
        order.tax_rate = Some(0.25);
        memory.orders.insert(order).await;

        let context = dispatch(&router, "order.canceled", json!({"id": "order_taxed"})).await;

        assert_eq!(field(&context, "items.0.price"), "6.25 USD");
        assert_eq!(field(&context, "subtotal"), "18.75 USD");
        assert_eq!(field(&context, "shipping_total"), "12.50 USD");
        assert_eq!(field(&context, "tax_total"), "0.00 USD");
        assert_eq!(field(&context, "total"), "24.30 USD");
    }

    #[tokio::test]
    async fn missing_rate_means_unscaled() {
        let (router, _) = seeded().await;
        let context = dispatch(&router, "order.canceled", json!({"id": "order_1"})).await;

        assert_eq!(field(&context, "items.0.price"), "5.00 USD");
        assert_eq!(field(&context, "subtotal"), "15.00 USD");
    }
}

mod returns {
    use super::*;

    #[tokio::test]
    async fn return_requested_context() {
        let (router, _) = seeded().await;
        let context = dispatch(
            &router,
            "order.return_requested",
            json!({"id": "order_1", "return_id": "ret_1"}),
        )
        .await;

        assert_eq!(field(&context, "shipping_total"), "11.50 USD");
        assert_eq!(field(&context, "has_shipping"), true);
        assert_eq!(field(&context, "subtotal"), "8.80 USD");
        assert_eq!(field(&context, "items.0.quantity"), 1);
        assert_eq!(field(&context, "items.0.price"), "8.80 USD");
        assert_eq!(field(&context, "refund_amount"), "8.80 USD");
        assert_eq!(field(&context, "return_request.refund_amount"), "8.80 USD");
        assert_eq!(field(&context, "date"), "Mon Apr 01 2024");
        assert_eq!(context.email(), Some("buyer@example.com"));
    }

    #[tokio::test]
    async fn items_returned_uses_same_fetcher() {
        let (router, _) = seeded().await;
        let payload = json!({"id": "order_1", "return_id": "ret_1"});
        let requested = dispatch(&router, "order.return_requested", payload.clone()).await;
        let returned = dispatch(&router, "order.items_returned", payload).await;
        assert_eq!(requested, returned);
    }

    #[tokio::test]
    async fn missing_line_item_is_an_error() {
        let (router, memory) = seeded().await;
        let mut request = return_request();
        request.id = "ret_orphan".into();
        request.items[0].item_id = "item_gone".into();
        memory.returns.insert(request).await;

        let err = router
            .dispatch_raw(
                "order.return_requested",
                json!({"id": "order_1", "return_id": "ret_orphan"}),
            )
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("item_gone"));
    }
}

mod swaps {
    use super::*;

    #[tokio::test]
    async fn created_splits_cart_lines() {
        let (router, _) = seeded().await;
        let context = dispatch(&router, "swap.created", json!({"id": "swap_1"})).await;

        assert_eq!(field(&context, "return_total"), "-5.50 USD");
        assert_eq!(field(&context, "additional_total"), "16.50 USD");
        assert_eq!(field(&context, "items").as_array().unwrap().len(), 1);
        assert_eq!(field(&context, "return_items").as_array().unwrap().len(), 1);
        assert_eq!(field(&context, "items.0.price"), "16.50 USD");
        assert_eq!(field(&context, "refund_amount"), "8.80 USD");
        assert_eq!(
            field(&context, "swap_link"),
            "https://shop.example/swap/cart_swap"
        );
        assert_eq!(field(&context, "return_request.items.0.item.id"), "item_1");
        assert_eq!(field(&context, "locale"), "de-DE");
    }

    #[tokio::test]
    async fn received_prices_without_currency() {
        let (router, _) = seeded().await;
        let context = dispatch(
            &router,
            "swap.received",
            json!({"id": "swap_1", "order_id": "order_1"}),
        )
        .await;

        assert_eq!(field(&context, "items.0.price"), "16.50");
        assert_eq!(field(&context, "return_total"), "-5.50 USD");
        assert_eq!(field(&context, "tax_total"), "11.00 USD");
    }

    #[tokio::test]
    async fn shipment_uses_calculator_totals() {
        let (router, _) = seeded().await;
        let context = dispatch(
            &router,
            "swap.shipment_created",
            json!({"id": "swap_1", "fulfillment_id": "ful_1"}),
        )
        .await;

        assert_eq!(field(&context, "paid_total"), "11.00 USD");
        assert_eq!(field(&context, "tax_amount"), "1.60 USD");
        assert_eq!(field(&context, "return_total"), "3.30 USD");
        assert_eq!(field(&context, "additional_total"), "22.00 USD");
        assert_eq!(field(&context, "items.0.quantity"), 1);
        assert_eq!(field(&context, "return_items.0.quantity"), 1);
    }

    #[tokio::test]
    async fn swap_without_cart_is_an_error() {
        let (router, memory) = seeded().await;
        let mut swap = swap();
        swap.id = "swap_nocart".into();
        swap.cart_id = None;
        memory.swaps.insert(swap).await;

        let result = router
            .dispatch_raw("swap.created", json!({"id": "swap_nocart"}))
            .await;
        assert!(result.is_err());
    }
}

mod gift_cards {
    use super::*;

    #[tokio::test]
    async fn value_includes_region_tax() {
        let (router, memory) = seeded().await;
        memory
            .gift_cards
            .insert(GiftCard {
                id: "gc_1".into(),
                code: "CARD".into(),
                value: 1000,
                region: Some(Region {
                    id: "reg_eu".into(),
                    tax_rate: Some(25.0),
                    ..Default::default()
                }),
                order: Some(Box::new(order())),
                ..Default::default()
            })
            .await;

        for name in ["gift_card.created", "order.gift_card_created"] {
            let context = dispatch(&router, name, json!({"id": "gc_1"})).await;
            assert_eq!(field(&context, "display_value"), 1250.0);
            assert_eq!(context.email(), Some("buyer@example.com"));
            assert_eq!(field(&context, "code"), "CARD");
        }
    }

    #[tokio::test]
    async fn card_without_order_is_empty() {
        let (router, memory) = seeded().await;
        memory
            .gift_cards
            .insert(GiftCard {
                id: "gc_loose".into(),
                code: "LOOSE".into(),
                value: 500,
                ..Default::default()
            })
            .await;

        let context = dispatch(&router, "gift_card.created", json!({"id": "gc_loose"})).await;
        assert!(context.is_empty());
    }
}

mod passthrough {
    use super::*;

    #[tokio::test]
    async fn claim_shipment() {
        let (router, memory) = seeded().await;
        memory
            .claims
            .insert(Claim {
                id: "claim_1".into(),
                order_id: "order_1".into(),
                kind: "replace".into(),
                order: Some(Box::new(order())),
                ..Default::default()
            })
            .await;

        let context = dispatch(
            &router,
            "claim.shipment_created",
            json!({"id": "claim_1", "fulfillment_id": "ful_1"}),
        )
        .await;

        assert_eq!(context.email(), Some("buyer@example.com"));
        assert_eq!(field(&context, "claim.type"), "replace");
        assert_eq!(field(&context, "order.id"), "order_1");
        assert_eq!(field(&context, "locale"), "de-DE");
    }

    #[tokio::test]
    async fn order_shipment() {
        let (router, _) = seeded().await;
        let context = dispatch(
            &router,
            "order.shipment_created",
            json!({"id": "order_1", "fulfillment_id": "ful_1"}),
        )
        .await;

        assert_eq!(context.len(), 3);
        assert_eq!(field(&context, "order.id"), "order_1");
    }

    #[tokio::test]
    async fn restock_normalizes_product_thumbnail() {
        let (router, memory) = seeded().await;
        memory
            .variants
            .insert(ProductVariant {
                id: "var_shirt".into(),
                title: "M".into(),
                product: Some(Product {
                    id: "prod_shirt".into(),
                    title: "Shirt".into(),
                    thumbnail: Some("//cdn.example.com/shirt.png".into()),
                    ..Default::default()
                }),
                ..Default::default()
            })
            .await;

        let context = dispatch(
            &router,
            "restock-notification.restocked",
            json!({"variant_id": "var_shirt", "emails": ["a@example.com", "b@example.com"]}),
        )
        .await;

        assert_eq!(
            field(&context, "product.thumbnail"),
            "https://cdn.example.com/shirt.png"
        );
        assert_eq!(field(&context, "variant_id"), "var_shirt");
        assert_eq!(field(&context, "emails.1"), "b@example.com");
        assert_eq!(context.email(), None);
    }

    #[tokio::test]
    async fn customer_password_reset_is_verbatim() {
        let (router, _) = seeded().await;
        let payload = json!({"id": "cus_1", "email": "c@example.com", "token": "tok"});
        let context = dispatch(&router, "customer.password_reset", payload.clone()).await;
        assert_eq!(context.into_value(), payload);
    }

    #[tokio::test]
    async fn user_password_reset_keeps_extra_fields() {
        let (router, memory) = seeded().await;
        let payload = json!({
            "email": "admin@example.com",
            "token": "reset-tok",
            "first_seen": 3,
            "meta": {"ip": "10.0.0.1"}
        });

        let context = dispatch(&router, "user.password_reset", payload.clone()).await;

        assert_eq!(context.email(), Some("admin@example.com"));
        assert_eq!(field(&context, "token"), "reset-tok");
        assert_eq!(field(&context, "meta.ip"), "10.0.0.1");
        assert_eq!(context.into_value(), payload);
        assert_eq!(memory.orders.request_count().await, 0);
    }

    #[tokio::test]
    async fn invite_created_is_addressed_to_invitee() {
        let (router, _) = seeded().await;
        let payload = json!({
            "id": "invite_1",
            "token": "invite-tok",
            "user_email": "new@example.com",
            "role": "member"
        });

        let context = dispatch(&router, "invite.created", payload.clone()).await;

        assert_eq!(context.email(), Some("new@example.com"));
        assert_eq!(field(&context, "email"), "new@example.com");
        assert_eq!(field(&context, "user_email"), "new@example.com");
        assert_eq!(field(&context, "id"), "invite_1");
        assert_eq!(field(&context, "token"), "invite-tok");
        assert_eq!(field(&context, "role"), "member");
        assert_eq!(context.len(), 5);

        let typed = router
            .dispatch(&NotificationEvent::parse("invite.created", payload).unwrap())
            .await
            .unwrap();
        assert_eq!(typed, context);
    }

    #[tokio::test]
    async fn unknown_event_touches_nothing() {
        let (router, memory) = seeded().await;

        let context = router
            .dispatch(&NotificationEvent::Unknown("product.updated".into()))
            .await
            .unwrap();
        let raw = dispatch(&router, "order.updated", json!({"id": "order_1"})).await;

        assert!(context.is_empty());
        assert!(raw.is_empty());
        assert_eq!(memory.orders.request_count().await, 0);
    }

    #[tokio::test]
    async fn typed_dispatch_matches_raw() {
        let (router, _) = seeded().await;
        let typed = router
            .dispatch(&NotificationEvent::OrderPlaced(EntityEventData::new("order_1")))
            .await
            .unwrap();
        let raw = dispatch(&router, "order.placed", json!({"id": "order_1"})).await;
        assert_eq!(typed, raw);
    }
}
