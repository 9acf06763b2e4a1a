//! Prints register events to stdout.

use std::sync::{Mutex, PoisonError};

use dukan_client::{ClientConfig, PosEventSink};
use dukan_core::{
    AcquiredBarcode, CartView, CheckoutState, Money, Notice, NoticeLevel, Product,
    SaleConfirmation,
};

pub struct TerminalSink {
    config: ClientConfig,
    /// Last result list, for `/add <n>`.
    results: Mutex<Vec<Product>>,
}

impl TerminalSink {
    pub fn new(config: ClientConfig) -> Self {
        TerminalSink {
            config,
            results: Mutex::new(Vec::new()),
        }
    }

    /// The n-th (1-based) product of the last result list.
    pub fn result(&self, n: usize) -> Option<Product> {
        let results = self.results.lock().unwrap_or_else(PoisonError::into_inner);
        n.checked_sub(1).and_then(|i| results.get(i).cloned())
    }

    fn money(&self, amount: Money) -> String {
        self.config.format_currency(amount)
    }

    /// Prints the full cart table.
    pub fn print_cart(&self, view: &CartView) {
        if view.lines.is_empty() {
            println!("  (cart is empty)");
        }
        for line in &view.lines {
            println!(
                "  #{:<6} {:<28} {:>4} x {:>12} = {:>12}   (max {})",
                line.product_id,
                line.name,
                line.quantity,
                self.money(line.unit_price),
                self.money(line.line_total),
                line.max_quantity,
            );
        }
        println!("  subtotal  {}", self.money(view.totals.subtotal));
        if !view.totals.discount.is_zero() {
            println!("  discount  {}", self.money(view.totals.discount));
        }
        println!("  total     {}", self.money(view.totals.total));

        let customer = &view.customer;
        if !customer.is_empty() {
            println!(
                "  customer  {} {}",
                customer.name.as_deref().unwrap_or("-"),
                customer.phone.as_deref().unwrap_or("")
            );
        }
        println!("  payment   {}", view.payment_method);
    }
}

impl PosEventSink for TerminalSink {
    fn cart_changed(&self, view: &CartView) {
        println!(
            "cart: {} item(s), {} unit(s), total {}",
            view.item_count,
            view.total_quantity,
            self.money(view.totals.total)
        );
    }

    fn search_results(&self, query: &str, products: &[Product]) {
        *self.results.lock().unwrap_or_else(PoisonError::into_inner) = products.to_vec();

        if query.is_empty() {
            return;
        }
        if products.is_empty() {
            println!("no products match \"{}\"", query);
            return;
        }
        for (i, product) in products.iter().enumerate() {
            let stock = if product.in_stock() {
                format!("{} in stock", product.quantity)
            } else {
                "out of stock".to_string()
            };
            println!(
                "  {:>2}. {:<28} {:>12}  {}",
                i + 1,
                product.name,
                self.money(product.price),
                stock
            );
        }
    }

    fn notice(&self, notice: &Notice) {
        let tag = match notice.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Success => " ok ",
            NoticeLevel::Warning => "warn",
            NoticeLevel::Danger => "FAIL",
        };
        println!("[{}] {}", tag, notice.message);
    }

    fn checkout_state_changed(&self, state: CheckoutState) {
        println!("checkout: {}", state);
    }

    fn sale_completed(&self, confirmation: &SaleConfirmation) {
        println!(
            "sale #{} invoice {} total {}",
            confirmation.sale_id,
            confirmation.invoice_number,
            self.money(confirmation.total_amount)
        );
        println!(
            "  view:  {}{}",
            self.config.api.base_url.trim_end_matches('/'),
            confirmation.invoice_path()
        );
        println!(
            "  print: {}{}",
            self.config.api.base_url.trim_end_matches('/'),
            confirmation.print_path()
        );
    }

    fn barcode_acquired(&self, barcode: &AcquiredBarcode) {
        println!("scanned {} ({:?})", barcode.code, barcode.origin);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_lookup_is_one_based() {
        let sink = TerminalSink::new(ClientConfig::default());
        let products = vec![
            Product::new(1, "Cola", Money::from_cents(1000), 3),
            Product::new(2, "Coffee", Money::from_cents(4500), 0),
        ];
        sink.search_results("co", &products);

        assert_eq!(sink.result(1).map(|p| p.id), Some(1));
        assert_eq!(sink.result(2).map(|p| p.id), Some(2));
        assert!(sink.result(0).is_none());
        assert!(sink.result(3).is_none());

        sink.search_results("", &[]);
        assert!(sink.result(1).is_none());
    }
}
