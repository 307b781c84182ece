//! State changes the model is asked to perform.

use super::params::RequestParams;

/// A mutation of the shop state, phrased for the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddToCart { id: String },
    RemoveFromCart { id: String },
    CreateProduct { params: RequestParams },
    UpdateProduct { id: String, params: RequestParams },
    DeleteProduct { id: String },
}

impl Command {
    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AddToCart { .. } => "add_to_cart",
            Self::RemoveFromCart { .. } => "remove_from_cart",
            Self::CreateProduct { .. } => "create_product",
            Self::UpdateProduct { .. } => "update_product",
            Self::DeleteProduct { .. } => "delete_product",
        }
    }

    /// Where the browser goes once the command has been applied.
    #[must_use]
    pub const fn redirect_to(&self) -> &'static str {
        match self {
            Self::AddToCart { .. } => "/",
            Self::RemoveFromCart { .. } => "/cart",
            Self::CreateProduct { .. } | Self::UpdateProduct { .. } | Self::DeleteProduct { .. } => {
                "/admin/products"
            }
        }
    }

    /// Natural-language instruction embedded in the mutation prompt.
    #[must_use]
    pub fn instruction(&self) -> String {
        match self {
            Self::AddToCart { id } => format!(
                "Add the product with the id {id} to the cart.\n\
                 If the product wasn't already in the cart, set its product count to one.\n\
                 If the product was already in the cart, increase its product count by one."
            ),
            Self::RemoveFromCart { id } => format!(
                "Remove the product with the id {id} from the cart.\n\
                 If the product isn't in the cart, do nothing.\n\
                 If the product is in the cart, completely remove it from the cart."
            ),
            Self::CreateProduct { params } => {
                format!("Create a new product with these properties: '{params}'")
            }
            Self::UpdateProduct { id, params } => {
                format!("Update the product with the id {id} using these properties: {params}")
            }
            Self::DeleteProduct { id } => format!("Delete the product with the id {id}"),
        }
    }
}
