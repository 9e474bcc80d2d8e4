//! Markdown detection from a product page's structured data.

use whscan_core::{Classification, PageDetails, PriceCode};

use super::jsonld::extract_product;
use super::{Assessment, Classifier};
use crate::fetch::FetchedPage;

/// Flags products whose price ends in a markdown code or that report a
/// non-zero discount count. Pages without usable structured data are
/// `NotMarkdown`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkdownClassifier;

impl MarkdownClassifier {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Classifier for MarkdownClassifier {
    fn classify(&self, page: &FetchedPage) -> Assessment {
        if page.status != 200 {
            return Assessment::bare(Classification::NotMarkdown);
        }
        let Some(product) = extract_product(&page.body) else {
            return Assessment::bare(Classification::NotMarkdown);
        };

        let price_code = product.price.map(PriceCode::from_price);
        let marked_down = price_code.is_some_and(PriceCode::is_markdown)
            || product.discount_count.is_some_and(|n| n > 0);

        Assessment {
            classification: if marked_down {
                Classification::Markdown
            } else {
                Classification::NotMarkdown
            },
            details: PageDetails {
                title: None,
                name: product.name,
                sku: product.sku,
                price: product.price,
                price_code,
                discount_count: product.discount_count,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_page(offer: &str) -> FetchedPage {
        FetchedPage::new(
            200,
            format!(
                r#"<script type="application/ld+json">{{"@type":"Product","name":"Widget","sku":"42","offers":{offer}}}</script>"#
            ),
        )
    }

    #[test]
    fn clearance_price_is_markdown() {
        let a = MarkdownClassifier.classify(&product_page(r#"{"price":"24.97"}"#));
        assert_eq!(a.classification, Classification::Markdown);
        assert_eq!(a.details.price_code, Some(PriceCode::CorporateClearance));
        assert_eq!(a.details.name.as_deref(), Some("Widget"));
    }

    #[test]
    fn manager_codes_are_markdown() {
        for (price, code) in [
            ("30.00", PriceCode::ManagerSpecial),
            ("30.88", PriceCode::ManagerMarkdown),
        ] {
            let a = MarkdownClassifier.classify(&product_page(&format!(r#"{{"price":"{price}"}}"#)));
            assert_eq!(a.classification, Classification::Markdown, "{price}");
            assert_eq!(a.details.price_code, Some(code));
        }
    }

    #[test]
    fn full_price_is_not_markdown() {
        let a = MarkdownClassifier.classify(&product_page(r#"{"price":"24.99"}"#));
        assert_eq!(a.classification, Classification::NotMarkdown);
        assert_eq!(a.details.price_code, Some(PriceCode::FullPrice));
    }

    #[test]
    fn discount_count_marks_full_price_item() {
        let a =
            MarkdownClassifier.classify(&product_page(r#"{"price":"24.99","discountCount":2}"#));
        assert_eq!(a.classification, Classification::Markdown);
        assert_eq!(a.details.discount_count, Some(2));
    }

    #[test]
    fn missing_data_and_error_status_are_not_markdown() {
        let bare = FetchedPage::new(200, "<html>no structured data</html>");
        assert_eq!(
            MarkdownClassifier.classify(&bare).classification,
            Classification::NotMarkdown
        );
        let gone = FetchedPage::new(404, "");
        assert_eq!(
            MarkdownClassifier.classify(&gone).classification,
            Classification::NotMarkdown
        );
    }
}
