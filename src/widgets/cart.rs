#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartAction {
    Add,
    Update,
    Remove,
}

impl CartAction {
    const fn verb(self) -> &'static str {
        match self {
            Self::Add => "added to",
            Self::Update => "updated in",
            Self::Remove => "removed from",
        }
    }
}

/// What the page should do after a cart mutation resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartEffect {
    /// Show the toast only.
    Notify { message: String, success: bool },
    /// Show the toast, then reload. Only the cart page reloads, so its
    /// totals and line items always reflect storage.
    NotifyAndReload { message: String },
}

/// Optimistic cart feedback state.
#[derive(Debug)]
pub struct CartNotifier {
    on_cart_page: bool,
}

impl CartNotifier {
    #[must_use]
    pub const fn new(on_cart_page: bool) -> Self {
        Self { on_cart_page }
    }

    /// The toast shown immediately, before the request resolves.
    #[must_use]
    pub fn optimistic_message(&self, action: CartAction, product_name: &str) -> String {
        format!("{product_name} {} cart", action.verb())
    }

    /// The effect once the endpoint responds.
    #[must_use]
    pub fn on_result(&self, action: CartAction, product_name: &str, success: bool) -> CartEffect {
        if !success {
            return CartEffect::Notify {
                message: format!("Could not update cart for {product_name}"),
                success: false,
            };
        }

        let message = self.optimistic_message(action, product_name);
        if self.on_cart_page {
            CartEffect::NotifyAndReload { message }
        } else {
            CartEffect::Notify {
                message,
                success: true,
            }
        }
    }

    /// Render the toast fragment.
    #[must_use]
    pub fn render_toast(message: &str, success: bool) -> String {
        let class = if success { "toast success" } else { "toast error" };
        format!(
            "<div class=\"{class}\" role=\"status\">{}</div>",
            html_escape::encode_text(message)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_off_cart_page_only_notifies() {
        let notifier = CartNotifier::new(false);
        let effect = notifier.on_result(CartAction::Add, "Bob Wig", true);
        assert_eq!(
            effect,
            CartEffect::Notify {
                message: "Bob Wig added to cart".to_string(),
                success: true
            }
        );
    }

    #[test]
    fn success_on_cart_page_reloads() {
        let notifier = CartNotifier::new(true);
        let effect = notifier.on_result(CartAction::Remove, "Bob Wig", true);
        assert!(matches!(effect, CartEffect::NotifyAndReload { .. }));
    }

    #[test]
    fn failure_never_reloads() {
        let notifier = CartNotifier::new(true);
        let effect = notifier.on_result(CartAction::Update, "Bob Wig", false);
        assert!(matches!(effect, CartEffect::Notify { success: false, .. }));
    }

    #[test]
    fn toast_escapes_content() {
        let html = CartNotifier::render_toast("<img onerror=x>", true);
        assert!(html.contains("&lt;img"));
    }
}
