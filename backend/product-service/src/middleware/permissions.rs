/// Authorization module for product-service
///
/// Ownership-based permission checks: only the seller of a product may
/// modify it. Existence is checked by the caller before ownership so that a
/// missing product is always reported as not found.
use crate::error::{AppError, Result};
use crate::models::Product;
use auth_core::{CallerContext, Identity};

/// Identity of a caller attempting a mutation
///
/// `Unset` surfaces as `IdentityNotProvided`, `Anonymous` as
/// `IdentityRequired`.
pub fn require_seller(caller: &CallerContext) -> Result<&Identity> {
    Ok(caller.require_identity()?)
}

/// Check if a caller owns a product
pub fn check_product_ownership(identity: &Identity, product: &Product) -> Result<()> {
    if identity.owns(&product.seller) {
        Ok(())
    } else {
        Err(AppError::PermissionDenied(format!(
            "you don't have permission to modify product {}",
            product.id
        )))
    }
}

/// Existence first, ownership second
pub fn check_product_mutation(
    identity: &Identity,
    id: &str,
    product: Option<Product>,
) -> Result<Product> {
    let product = product.ok_or_else(|| AppError::NotFound(format!("product {}", id)))?;
    check_product_ownership(identity, &product)?;
    Ok(product)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(seller: &str) -> Product {
        Product {
            id: "p1".to_string(),
            name: "lamp".to_string(),
            price: 100,
            seller: seller.to_string(),
        }
    }

    #[test]
    fn test_require_seller() {
        assert_eq!(
            require_seller(&CallerContext::Unset),
            Err(AppError::IdentityNotProvided)
        );
        assert_eq!(
            require_seller(&CallerContext::Anonymous),
            Err(AppError::IdentityRequired)
        );
        assert_eq!(
            require_seller(&CallerContext::authenticated("A")).map(Identity::subject),
            Ok("A")
        );
    }

    #[test]
    fn test_ownership_is_exact_match() {
        let owner = Identity::new("A");
        assert!(check_product_ownership(&owner, &product("A")).is_ok());
        assert!(matches!(
            check_product_ownership(&owner, &product("a")),
            Err(AppError::PermissionDenied(_))
        ));
        assert!(matches!(
            check_product_ownership(&owner, &product("A ")),
            Err(AppError::PermissionDenied(_))
        ));
    }

    #[test]
    fn test_missing_product_is_not_found_for_anyone() {
        for subject in ["A", "B"] {
            assert_eq!(
                check_product_mutation(&Identity::new(subject), "p1", None),
                Err(AppError::NotFound("product p1".to_string()))
            );
        }
    }
}
