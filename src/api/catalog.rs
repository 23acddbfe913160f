//! Product catalog and admin product management.

use reqwest::multipart::{Form, Part};
use reqwest::Method;
use tracing::instrument;

use super::ApiClient;
use crate::domain::aggregates::{Product, ProductDraft};
use crate::Result;

impl ApiClient {
    #[instrument(skip(self))]
    pub async fn fetch_products(&self) -> Result<Vec<Product>> {
        self.send(self.request(Method::GET, "/products")).await
    }

    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn add_product(&self, draft: &ProductDraft) -> Result<()> {
        let form = product_form(draft)?;
        self.send_unit(self.authed(Method::POST, "/products/add")?.multipart(form)).await
    }

    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn update_product(&self, product_id: &str, draft: &ProductDraft) -> Result<()> {
        let form = product_form(draft)?;
        self.send_unit(self.authed(Method::PUT, &format!("/products/update/{product_id}"))?.multipart(form)).await
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: &str) -> Result<()> {
        self.send_unit(self.authed(Method::DELETE, &format!("/products/delete/{product_id}"))?).await
    }
}

fn product_form(draft: &ProductDraft) -> Result<Form> {
    let mut form = Form::new()
        .text("name", draft.name.trim().to_string())
        .text("description", draft.description.trim().to_string())
        .text("category", draft.category.trim().to_string());
    if let Some(price) = draft.price { form = form.text("price", price.to_string()); }
    if let Some(original) = draft.original_price { form = form.text("originalPrice", original.to_string()); }
    if let Some(quantity) = draft.quantity { form = form.text("quantity", quantity.to_string()); }

    if !draft.new_images.is_empty() {
        for image in &draft.new_images {
            let part = Part::bytes(image.bytes.clone()).file_name(image.file_name.clone()).mime_str(&image.content_type)?;
            form = form.part("productImages", part);
        }
        form = form.text("replaceExistingImages", "true");
    } else if !draft.retained_images.is_empty() {
        form = form.text("currentImageUrlsToRetain", serde_json::to_string(&draft.retained_images)?);
    }
    Ok(form)
}
