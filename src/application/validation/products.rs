use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::{Validate, ValidateUrl, ValidationError};

use super::{
    DoubleOption, FieldError, FieldOrder, FlagInput, NumberInput, TextInput, TextRules,
    deserialize_double_option, deserialize_present, first_error, rule,
};
use crate::domain::products::product::{
    GalleryImage, MAX_GALLERY_IMAGES, MAX_PRICE, NewProduct, ProductChanges, round_price,
};
use crate::domain::products::slug::{SLUG_MAX_LEN, SLUG_MIN_LEN, is_valid_slug, normalize_slug};

const DISCOUNT_ABOVE_PRICE: &str = "Discounted price must be less than regular price";

const FIELD_ORDER: &FieldOrder = &[
    ("meta_title", "metaTitle"),
    ("product_name", "productName"),
    ("slug", "slug"),
    ("price", "price"),
    ("discounted_price", "discountedPrice"),
    ("description", "description"),
    ("gallery_images", "galleryImages"),
    ("is_active", "isActive"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImageInput {
    #[schema(value_type = String)]
    pub url: Option<TextInput>,
    #[schema(value_type = Option<String>)]
    pub public_id: Option<TextInput>,
    #[schema(value_type = Option<String>)]
    pub alt: Option<TextInput>,
}

impl GalleryImageInput {
    fn into_image(self) -> GalleryImage {
        GalleryImage {
            url: self.url.and_then(TextInput::into_string).unwrap_or_default(),
            public_id: self.public_id.and_then(TextInput::into_string),
            alt: self.alt.and_then(TextInput::into_string).unwrap_or_default(),
        }
    }
}

/// The image list, or whatever was sent in its place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GalleryInput {
    Images(Vec<GalleryImageInput>),
    Other(Value),
}

impl GalleryInput {
    fn into_images(self) -> Vec<GalleryImage> {
        match self {
            GalleryInput::Images(images) => {
                images.into_iter().map(GalleryImageInput::into_image).collect()
            }
            GalleryInput::Other(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[validate(
        required(message = "Meta title is required"),
        custom(function = "meta_title_rules")
    )]
    #[serde(default, deserialize_with = "deserialize_present")]
    #[schema(value_type = String)]
    pub meta_title: Option<TextInput>,
    #[validate(
        required(message = "Product name is required"),
        custom(function = "product_name_rules")
    )]
    #[serde(default, deserialize_with = "deserialize_present")]
    #[schema(value_type = String)]
    pub product_name: Option<TextInput>,
    #[validate(required(message = "URL slug is required"), custom(function = "slug_rules"))]
    #[serde(default, deserialize_with = "deserialize_present")]
    #[schema(value_type = String)]
    pub slug: Option<TextInput>,
    #[validate(required(message = "Price is required"), custom(function = "price_rules"))]
    #[serde(default, deserialize_with = "deserialize_present")]
    #[schema(value_type = f64)]
    pub price: Option<NumberInput>,
    /// Optional, but an explicit `null` is not a number.
    #[validate(custom(function = "discounted_price_rules"))]
    #[serde(default, deserialize_with = "deserialize_present")]
    #[schema(value_type = Option<f64>)]
    pub discounted_price: Option<NumberInput>,
    #[validate(
        required(message = "Description is required"),
        custom(function = "description_rules")
    )]
    #[serde(default, deserialize_with = "deserialize_present")]
    #[schema(value_type = String)]
    pub description: Option<TextInput>,
    #[validate(custom(function = "gallery_rules"))]
    #[serde(default, deserialize_with = "deserialize_present")]
    #[schema(value_type = Option<Vec<GalleryImageInput>>)]
    pub gallery_images: Option<GalleryInput>,
    #[validate(custom(function = "is_active_rules"))]
    #[serde(default, deserialize_with = "deserialize_present")]
    #[schema(value_type = Option<bool>)]
    pub is_active: Option<FlagInput>,
}

impl CreateProductRequest {
    /// Applies every rule and yields the normalized product. The description
    /// is still raw here; sanitizing happens in the create use case.
    pub fn into_new_product(self) -> Result<NewProduct, FieldError> {
        if let Err(errors) = self.validate() {
            if let Some(first) = first_error(&errors, FIELD_ORDER) {
                return Err(first);
            }
        }
        let price = self
            .price
            .as_ref()
            .and_then(NumberInput::as_f64)
            .map(round_price)
            .ok_or_else(|| FieldError::new("price", "Price is required"))?;
        let discounted_price = self
            .discounted_price
            .as_ref()
            .and_then(NumberInput::as_f64)
            .map(round_price);
        if discounted_price.is_some_and(|d| d >= price) {
            return Err(FieldError::new("discountedPrice", DISCOUNT_ABOVE_PRICE));
        }
        Ok(NewProduct {
            meta_title: text(self.meta_title).unwrap_or_default().trim().to_string(),
            product_name: text(self.product_name).unwrap_or_default().trim().to_string(),
            slug: normalize_slug(&text(self.slug).unwrap_or_default()),
            gallery_images: self
                .gallery_images
                .map(GalleryInput::into_images)
                .unwrap_or_default(),
            price,
            discounted_price,
            description: text(self.description).unwrap_or_default(),
            is_active: self
                .is_active
                .as_ref()
                .and_then(FlagInput::as_bool)
                .unwrap_or(true),
        })
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    #[validate(custom(function = "meta_title_rules"))]
    #[serde(default, deserialize_with = "deserialize_present")]
    #[schema(value_type = Option<String>)]
    pub meta_title: Option<TextInput>,
    #[validate(custom(function = "product_name_rules"))]
    #[serde(default, deserialize_with = "deserialize_present")]
    #[schema(value_type = Option<String>)]
    pub product_name: Option<TextInput>,
    #[validate(custom(function = "slug_rules"))]
    #[serde(default, deserialize_with = "deserialize_present")]
    #[schema(value_type = Option<String>)]
    pub slug: Option<TextInput>,
    #[validate(custom(function = "price_rules"))]
    #[serde(default, deserialize_with = "deserialize_present")]
    #[schema(value_type = Option<f64>)]
    pub price: Option<NumberInput>,
    /// `null` removes the discount.
    #[serde(default, deserialize_with = "deserialize_double_option")]
    #[schema(value_type = Option<f64>)]
    pub discounted_price: DoubleOption<NumberInput>,
    #[validate(custom(function = "description_rules"))]
    #[serde(default, deserialize_with = "deserialize_present")]
    #[schema(value_type = Option<String>)]
    pub description: Option<TextInput>,
    #[validate(custom(function = "gallery_rules"))]
    #[serde(default, deserialize_with = "deserialize_present")]
    #[schema(value_type = Option<Vec<GalleryImageInput>>)]
    pub gallery_images: Option<GalleryInput>,
    #[validate(custom(function = "is_active_rules"))]
    #[serde(default, deserialize_with = "deserialize_present")]
    #[schema(value_type = Option<bool>)]
    pub is_active: Option<FlagInput>,
}

impl UpdateProductRequest {
    pub fn into_changes(self) -> Result<ProductChanges, FieldError> {
        if let Err(errors) = self.validate() {
            if let Some(first) = first_error(&errors, FIELD_ORDER) {
                return Err(first);
            }
        }
        let discounted_price = match &self.discounted_price {
            DoubleOption::NotProvided => None,
            DoubleOption::Null => Some(None),
            DoubleOption::Some(input) => {
                discounted_price_rules(input).map_err(|e| {
                    FieldError::new(
                        "discountedPrice",
                        e.message.map(|m| m.to_string()).unwrap_or_default(),
                    )
                })?;
                Some(input.as_f64().map(round_price))
            }
        };
        let price = self.price.as_ref().and_then(NumberInput::as_f64).map(round_price);
        if let (Some(price), Some(Some(discount))) = (price, discounted_price) {
            if discount >= price {
                return Err(FieldError::new("discountedPrice", DISCOUNT_ABOVE_PRICE));
            }
        }
        let changes = ProductChanges {
            meta_title: text(self.meta_title).map(|s| s.trim().to_string()),
            product_name: text(self.product_name).map(|s| s.trim().to_string()),
            slug: text(self.slug).as_deref().map(normalize_slug),
            gallery_images: self.gallery_images.map(GalleryInput::into_images),
            price,
            discounted_price,
            description: text(self.description),
            is_active: self.is_active.as_ref().and_then(FlagInput::as_bool),
        };
        if changes.is_empty() {
            return Err(FieldError::body(
                "At least one field must be provided for update",
            ));
        }
        Ok(changes)
    }
}

fn text(input: Option<TextInput>) -> Option<String> {
    input.and_then(TextInput::into_string)
}

fn meta_title_rules(value: &TextInput) -> Result<(), ValidationError> {
    TextRules {
        min: 3,
        max: 60,
        not_text: "\"metaTitle\" must be a string",
        empty: "Meta title is required",
        too_short: "Meta title must be at least 3 characters",
        too_long: "Meta title cannot exceed 60 characters",
    }
    .check(value)
}

fn product_name_rules(value: &TextInput) -> Result<(), ValidationError> {
    TextRules {
        min: 3,
        max: 200,
        not_text: "\"productName\" must be a string",
        empty: "Product name is required",
        too_short: "Product name must be at least 3 characters",
        too_long: "Product name cannot exceed 200 characters",
    }
    .check(value)
}

fn description_rules(value: &TextInput) -> Result<(), ValidationError> {
    TextRules {
        min: 10,
        max: 5000,
        not_text: "\"description\" must be a string",
        empty: "Description is required",
        too_short: "Description must be at least 10 characters",
        too_long: "Description cannot exceed 5000 characters",
    }
    .check(value)
}

fn slug_rules(value: &TextInput) -> Result<(), ValidationError> {
    let Some(value) = value.as_str() else {
        return Err(rule("string.base", "\"slug\" must be a string"));
    };
    if value.is_empty() {
        return Err(rule("string.empty", "URL slug is required"));
    }
    if !is_valid_slug(value) {
        return Err(rule(
            "string.pattern.base",
            "Slug must be lowercase with hyphens only (e.g., product-name)",
        ));
    }
    let len = value.chars().count();
    if len < SLUG_MIN_LEN {
        return Err(rule("string.min", "Slug must be at least 3 characters"));
    }
    if len > SLUG_MAX_LEN {
        return Err(rule("string.max", "Slug cannot exceed 100 characters"));
    }
    Ok(())
}

fn price_rules(value: &NumberInput) -> Result<(), ValidationError> {
    let Some(price) = value.as_f64() else {
        return Err(rule("number.base", "Price must be a valid number"));
    };
    if price < 0.0 {
        return Err(rule("number.min", "Price cannot be negative"));
    }
    if price > MAX_PRICE {
        return Err(rule("number.max", "Price seems unreasonably high"));
    }
    Ok(())
}

fn discounted_price_rules(value: &NumberInput) -> Result<(), ValidationError> {
    let Some(price) = value.as_f64() else {
        return Err(rule("number.base", "Discounted price must be a valid number"));
    };
    if price < 0.0 {
        return Err(rule("number.min", "Discounted price cannot be negative"));
    }
    Ok(())
}

fn is_active_rules(value: &FlagInput) -> Result<(), ValidationError> {
    match value.as_bool() {
        Some(_) => Ok(()),
        None => Err(rule("boolean.base", "\"isActive\" must be a boolean")),
    }
}

fn image_rule(code: &'static str, message: String) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Owned(message))
}

fn gallery_rules(input: &GalleryInput) -> Result<(), ValidationError> {
    let images = match input {
        GalleryInput::Images(images) => images,
        GalleryInput::Other(Value::Array(items)) => {
            let index = items.iter().position(|item| !item.is_object()).unwrap_or(0);
            return Err(image_rule(
                "object.base",
                format!("\"galleryImages[{index}]\" must be of type object"),
            ));
        }
        GalleryInput::Other(_) => {
            return Err(rule("array.base", "\"galleryImages\" must be an array"));
        }
    };
    if images.len() > MAX_GALLERY_IMAGES {
        return Err(rule("array.max", "Cannot have more than 10 gallery images"));
    }
    for (index, image) in images.iter().enumerate() {
        match &image.url {
            None => return Err(rule("any.required", "Gallery image URL is required")),
            Some(TextInput::Other(_)) => {
                return Err(image_rule(
                    "string.base",
                    format!("\"galleryImages[{index}].url\" must be a string"),
                ));
            }
            Some(TextInput::Text(url)) if url.is_empty() => {
                return Err(rule("any.required", "Gallery image URL is required"));
            }
            Some(TextInput::Text(url)) if !url.validate_url() => {
                return Err(rule("string.uri", "Gallery image URL must be a valid URI"));
            }
            Some(TextInput::Text(_)) => {}
        }
        for (name, value) in [("publicId", &image.public_id), ("alt", &image.alt)] {
            if matches!(value, Some(TextInput::Other(_))) {
                return Err(image_rule(
                    "string.base",
                    format!("\"galleryImages[{index}].{name}\" must be a string"),
                ));
            }
        }
        if image
            .alt
            .as_ref()
            .and_then(TextInput::as_str)
            .is_some_and(|alt| alt.chars().count() > 200)
        {
            return Err(rule(
                "string.max",
                "Gallery image alt text cannot exceed 200 characters",
            ));
        }
    }
    Ok(())
}
