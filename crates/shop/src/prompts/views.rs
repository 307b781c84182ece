//! The shop's logical pages and what each one should show.

use std::fmt;

use super::params::RequestParams;

/// Name of the layout page. It wraps every fragment and is never generated.
pub const LAYOUT_PAGE: &str = "page";

/// A logical page with its own cached fragment template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    /// Product grid with cart sidebar (`GET /`).
    Products,
    /// Single product detail (`GET /products/{id}`).
    Product,
    /// Cart detail (`GET /cart`).
    Cart,
    /// Admin product table (`GET /admin/products`).
    AdminProducts,
    /// New product form (`GET /admin/products/new`).
    AdminProductsNew,
    /// Edit product form (`GET /admin/products/{id}/edit`).
    AdminProductsEdit,
}

const CART_SIDEBAR: &str = "Also display the cart at the top of the right sidebar.\n\
    The cart should display all line item product names and the product counts, in one line for each item.\n\
    The cart should also display the total cost of all product prices times the product counts.\n\
    Use dollars as the currency.\n\
    Also in the cart display a button to show the cart. The button URL is '/cart'.\n\
    Draw a border around the cart.";

impl View {
    /// Every view, in route order.
    pub const ALL: [Self; 6] = [
        Self::Products,
        Self::Product,
        Self::Cart,
        Self::AdminProducts,
        Self::AdminProductsNew,
        Self::AdminProductsEdit,
    ];

    /// Cache key and fragment file stem.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Product => "product",
            Self::Cart => "cart",
            Self::AdminProducts => "admin_products",
            Self::AdminProductsNew => "admin_products_new",
            Self::AdminProductsEdit => "admin_products_edit",
        }
    }

    /// Look a view up by its name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|view| view.name() == name)
    }

    /// Natural-language description of the page for the given request.
    #[must_use]
    pub fn instructions(self, params: &RequestParams) -> String {
        let id = params.get_or_empty("id");
        match self {
            Self::Products => format!(
                "Display all products in grid of cards with two columns.\n\
                 For each product display the name and the price.\n\
                 A click on the product should open the URL '/products/:id' where :id is the id of the product.\n\
                 {CART_SIDEBAR}"
            ),
            Self::Product => format!(
                "Display the single product with the id {id} in its full glory.\n\
                 Display all properties of the product.\n\
                 Display a button for adding the product to the cart. This buttons URL is '/cart/add/:id',\n\
                 where :id is the product id.\n\
                 Also display a button for going back to the product list. This buttons URL is '/'\n\
                 {CART_SIDEBAR}"
            ),
            Self::Cart => "Display the cart.\n\
                 For each line item display a row containing the product name, the product single price the product count,\n\
                 the total cost and a button to remove the line item from the cart.\n\
                 The remove button URL is '/cart/remove/:id', where :id is the product id.\n\
                 Below the line items, display the total cost of all products.\n\
                 Use dollars as the currency.\n\
                 Display a button for checking out the cart. The URL of the button is '/cart/checkout'.\n\
                 Also display a button for going back to the product list. This buttons URL is '/'"
                .to_string(),
            Self::AdminProducts => "Display all products in a table one row for each product.\n\
                 Display the id, name and price for each product.\n\
                 Each product has a delete link with an icon.\n\
                 The URL for the delete link is '/admin/products/:id/delete'. Use the id of the respective product for ':id'.\n\
                 Each product has an edit link with an icon.\n\
                 The URL for the edit link is '/admin/products/:id/edit'. Use the ID of the respective product for ':id'.\n\
                 Display a button for creating a new product. The URL of the button is '/admin/products/new'."
                .to_string(),
            Self::AdminProductsNew => "Display a form for entering a new product.\n\
                 Include all product attributes except for the ID.\n\
                 The action URL of the form is '/admin/products'.\n\
                 Also add a back button to the form, that links to the URL '/admin/products'."
                .to_string(),
            Self::AdminProductsEdit => format!(
                "Display a form for editing the product with id {id}.\n\
                 Show all product attributes except for the ID.\n\
                 The current product data is in the parameters.\n\
                 The target URL of the form is '/admin/products/:id'. Use the ID of the respective product for ':id'.\n\
                 The HTTP method of the form is POST.\n\
                 Add a hidden field to the form with the name '_method' and the value 'PUT'.\n\
                 Also add a back button to the form, that links to the URL '/admin/products'."
            ),
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip_and_exclude_layout() {
        for view in View::ALL {
            assert_eq!(View::from_name(view.name()), Some(view));
            assert_ne!(view.name(), LAYOUT_PAGE);
        }
        assert_eq!(View::from_name(LAYOUT_PAGE), None);
    }

    #[test]
    fn test_product_instructions_embed_id() {
        let params = RequestParams::new().with("id", "abc-123");
        let text = View::Product.instructions(&params);
        assert!(text.contains("with the id abc-123 in its full glory"));
        assert!(text.contains("'/cart/add/:id'"));
        assert!(text.contains("top of the right sidebar"));
    }

    #[test]
    fn test_edit_instructions_request_method_override() {
        let params = RequestParams::new().with("id", "abc-123");
        let text = View::AdminProductsEdit.instructions(&params);
        assert!(text.contains("editing the product with id abc-123"));
        assert!(text.contains("'_method' and the value 'PUT'"));
    }

    #[test]
    fn test_admin_listing_links_match_routes() {
        let text = View::AdminProducts.instructions(&RequestParams::new());
        assert!(text.contains("'/admin/products/:id/delete'"));
        assert!(text.contains("'/admin/products/:id/edit'"));
        assert!(text.contains("'/admin/products/new'"));
    }
}
