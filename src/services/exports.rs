//! Channel catalog export.
//!
//! Turns a set of products into the CSV layout one sales channel expects:
//! localized text, per-variant sale prices from the percent-based pricing
//! policy, and field-to-column mapping through a resolved channel template.

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::entities::{product, product_localization, product_option};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::pricing::{PriceOverrides, PricingService};
use crate::services::templates::{ChannelTemplate, ChannelTemplateLoader};

/// Per-call template configuration; every value layers over the product and
/// process-wide defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateConfig {
    pub locale: Option<String>,
    pub exchange_rate: Option<Decimal>,
    pub margin_rate: Option<Decimal>,
    pub vat_rate: Option<Decimal>,
    pub shipping_fee: Option<Decimal>,
    pub return_policy_image_url: Option<String>,
}

impl TemplateConfig {
    fn price_overrides(&self) -> PriceOverrides {
        PriceOverrides {
            exchange_rate: self.exchange_rate,
            margin_rate: self.margin_rate,
            vat_rate: self.vat_rate,
            shipping_fee: self.shipping_fee,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportRequest {
    pub product_ids: Vec<i64>,
    #[serde(default = "default_template_type")]
    pub template_type: String,
    pub locale: Option<String>,
    #[serde(default)]
    pub template_config: TemplateConfig,
}

fn default_template_type() -> String {
    "default".to_string()
}

/// A rendered catalog: UTF-8 CSV bytes plus the number of data rows.
#[derive(Debug)]
pub struct CatalogCsv {
    pub bytes: Vec<u8>,
    pub data_rows: usize,
}

/// One row's worth of resolved semantic fields, before column mapping.
struct RowFields {
    title: String,
    price: Decimal,
    option_name: String,
    option_value: String,
    description: String,
    main_image: String,
}

#[derive(Clone)]
pub struct CatalogExporter {
    loader: ChannelTemplateLoader,
    pricing: PricingService,
    default_locale: String,
    return_policy_image_url: Option<String>,
    event_sender: Option<Arc<EventSender>>,
}

impl CatalogExporter {
    pub fn new(
        loader: ChannelTemplateLoader,
        pricing: PricingService,
        default_locale: String,
        return_policy_image_url: Option<String>,
        event_sender: Option<Arc<EventSender>>,
    ) -> Self {
        Self {
            loader,
            pricing,
            default_locale,
            return_policy_image_url,
            event_sender,
        }
    }

    /// Renders the catalog CSV for the requested products.
    ///
    /// One row per product option; products without options contribute a
    /// single base row. The header row is exactly the resolved template's
    /// column headers, in column order.
    #[instrument(skip(self, db, request), fields(channel = %channel, product_count = request.product_ids.len()))]
    pub async fn export_products(
        &self,
        db: &DatabaseConnection,
        channel: &str,
        request: &ExportRequest,
    ) -> Result<CatalogCsv, ServiceError> {
        if request.product_ids.is_empty() {
            return Err(ServiceError::ValidationError(
                "product_ids is empty".to_string(),
            ));
        }

        let template = self.resolve_template(db, channel, &request.template_type).await?;
        let locale = self.resolve_locale(request, &template);

        let products = product::Entity::find()
            .filter(product::Column::Id.is_in(request.product_ids.clone()))
            .all(db)
            .await?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        let headers: Vec<&str> = template.columns.iter().map(|c| c.header.as_str()).collect();
        writer
            .write_record(&headers)
            .map_err(|e| ServiceError::InternalError(format!("csv write failed: {}", e)))?;

        let mut data_rows = 0usize;
        for product in &products {
            let localizations = product_localization::Entity::find()
                .filter(product_localization::Column::ProductId.eq(product.id))
                .order_by_asc(product_localization::Column::Id)
                .all(db)
                .await?;
            let options = product_option::Entity::find()
                .filter(product_option::Column::ProductId.eq(product.id))
                .order_by_asc(product_option::Column::Id)
                .all(db)
                .await?;

            let (title, description) = localized_text(product, &localizations, &locale);
            let description = self.with_return_policy(description, &request.template_config);
            let overrides = PriceOverrides::layered(
                request.template_config.price_overrides(),
                product_overrides(product),
            );
            let main_image = first_image(product);

            if options.is_empty() {
                let fields = RowFields {
                    title: title.clone(),
                    price: self
                        .pricing
                        .calculate_sale_price(product.raw_price, Decimal::ZERO, &overrides)?,
                    option_name: String::new(),
                    option_value: String::new(),
                    description: description.clone(),
                    main_image: main_image.clone(),
                };
                write_row(&mut writer, &template, &fields)?;
                data_rows += 1;
            } else {
                for option in &options {
                    let fields = RowFields {
                        title: title.clone(),
                        price: self.pricing.calculate_sale_price(
                            product.raw_price,
                            option.raw_price_diff,
                            &overrides,
                        )?,
                        option_name: "옵션".to_string(),
                        option_value: option
                            .localized_name
                            .clone()
                            .unwrap_or_else(|| option.raw_name.clone()),
                        description: description.clone(),
                        main_image: main_image.clone(),
                    };
                    write_row(&mut writer, &template, &fields)?;
                    data_rows += 1;
                }
            }
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ServiceError::InternalError(format!("csv write failed: {}", e)))?;

        info!(channel = %template.channel, rows = data_rows, "Catalog exported");

        if let Some(event_sender) = &self.event_sender {
            let event = Event::CatalogExported {
                channel: template.channel.clone(),
                rows: data_rows,
            };
            if let Err(e) = event_sender.send(event).await {
                warn!(error = %e, "Failed to send catalog exported event");
            }
        }

        Ok(CatalogCsv { bytes, data_rows })
    }

    async fn resolve_template(
        &self,
        db: &DatabaseConnection,
        channel: &str,
        template_type: &str,
    ) -> Result<ChannelTemplate, ServiceError> {
        match self.loader.load(channel, template_type, Some(db)).await {
            Ok(template) => Ok(template),
            // Channels without an explicit definition still get the stock
            // layout for their "default" catalog. Loud, so a misdeployed
            // template directory is visible.
            Err(ServiceError::TemplateNotFound { .. })
                if template_type.eq_ignore_ascii_case("default") =>
            {
                warn!(channel = %channel, "No template defined; using the built-in default layout");
                let mut template = ChannelTemplate::smartstore_default();
                template.channel = channel.to_lowercase();
                Ok(template)
            }
            Err(e) => Err(e),
        }
    }

    fn resolve_locale(&self, request: &ExportRequest, template: &ChannelTemplate) -> String {
        request
            .locale
            .clone()
            .or_else(|| request.template_config.locale.clone())
            .or_else(|| template.locale.clone())
            .unwrap_or_else(|| self.default_locale.clone())
    }

    fn with_return_policy(&self, mut description: String, config: &TemplateConfig) -> String {
        let url = config
            .return_policy_image_url
            .as_ref()
            .or(self.return_policy_image_url.as_ref());
        if let Some(url) = url {
            description.push_str(&format!("<img src=\"{}\">", url));
        }
        description
    }
}

/// Picks title and description for the effective locale. Each falls back
/// independently: exact locale match, then the first localization row, then
/// the raw (unlocalized) fields.
fn localized_text(
    product: &product::Model,
    localizations: &[product_localization::Model],
    locale: &str,
) -> (String, String) {
    let exact = localizations.iter().find(|l| l.locale == locale);

    let title = exact
        .map(|l| l.title.clone())
        .or_else(|| localizations.first().map(|l| l.title.clone()))
        .unwrap_or_else(|| product.raw_title.clone());

    let description = exact
        .and_then(|l| l.description.clone())
        .or_else(|| localizations.iter().find_map(|l| l.description.clone()))
        .or_else(|| product.raw_description.clone())
        .unwrap_or_default();

    (title, description)
}

fn product_overrides(product: &product::Model) -> PriceOverrides {
    PriceOverrides {
        exchange_rate: product.exchange_rate,
        margin_rate: product.margin_rate,
        vat_rate: product.vat_rate,
        shipping_fee: product.shipping_fee,
    }
}

fn first_image(product: &product::Model) -> String {
    product
        .image_urls
        .as_array()
        .and_then(|urls| urls.first())
        .and_then(|url| url.as_str())
        .unwrap_or_default()
        .to_string()
}

fn write_row(
    writer: &mut csv::Writer<Vec<u8>>,
    template: &ChannelTemplate,
    fields: &RowFields,
) -> Result<(), ServiceError> {
    let mut record = Vec::with_capacity(template.columns.len());
    for column in &template.columns {
        record.push(field_value(template, &column.field, fields)?);
    }
    writer
        .write_record(&record)
        .map_err(|e| ServiceError::InternalError(format!("csv write failed: {}", e)))
}

/// Maps one semantic field key to its rendered value. An unknown key is a
/// configuration defect in the template, reported rather than skipped.
fn field_value(
    template: &ChannelTemplate,
    field: &str,
    fields: &RowFields,
) -> Result<String, ServiceError> {
    let value = match field {
        "title" => fields.title.clone(),
        "price" => fields.price.to_string(),
        "stock" => "0".to_string(),
        "option_name" => fields.option_name.clone(),
        "option_value" => fields.option_value.clone(),
        "description" => fields.description.clone(),
        "main_image" => fields.main_image.clone(),
        _ => {
            return Err(ServiceError::UnknownTemplateField {
                channel: template.channel.clone(),
                template_type: template.template_type.clone(),
                field: field.to_string(),
            })
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_fields() -> RowFields {
        RowFields {
            title: "샘플 가방".to_string(),
            price: dec!(21250),
            option_name: "옵션".to_string(),
            option_value: "Red / M".to_string(),
            description: "가볍고 튼튼한 데일리 백".to_string(),
            main_image: "https://example.com/img.jpg".to_string(),
        }
    }

    #[test]
    fn unknown_field_names_the_template_and_field() {
        let template = ChannelTemplate::smartstore_default();
        let err = field_value(&template, "brand", &sample_fields()).unwrap_err();
        match err {
            ServiceError::UnknownTemplateField { channel, field, .. } => {
                assert_eq!(channel, "smartstore");
                assert_eq!(field, "brand");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn stock_is_a_placeholder_zero() {
        let template = ChannelTemplate::smartstore_default();
        assert_eq!(field_value(&template, "stock", &sample_fields()).unwrap(), "0");
    }

    #[test]
    fn title_and_description_fall_back_independently() {
        let product = product::Model {
            id: 1,
            source_url: "https://example.com/item/1".to_string(),
            source_site: "TAOBAO".to_string(),
            raw_title: "raw title".to_string(),
            raw_description: Some("raw description".to_string()),
            raw_price: dec!(10),
            raw_currency: "CNY".to_string(),
            exchange_rate: None,
            margin_rate: None,
            vat_rate: None,
            shipping_fee: None,
            image_urls: serde_json::json!([]),
            detail_image_urls: serde_json::json!([]),
            created_at: chrono::Utc::now(),
            updated_at: None,
        };
        // ja-JP row has a title but no description; en-US has both. With no
        // exact ko-KR match the title comes from the first row and the
        // description from the first row that has one.
        let localizations = vec![
            product_localization::Model {
                id: 1,
                product_id: 1,
                locale: "ja-JP".to_string(),
                title: "日本語タイトル".to_string(),
                description: None,
                option_display_name_format: None,
            },
            product_localization::Model {
                id: 2,
                product_id: 1,
                locale: "en-US".to_string(),
                title: "english title".to_string(),
                description: Some("english description".to_string()),
                option_display_name_format: None,
            },
        ];

        let (title, description) = localized_text(&product, &localizations, "ko-KR");
        assert_eq!(title, "日本語タイトル");
        assert_eq!(description, "english description");

        let (title, description) = localized_text(&product, &[], "ko-KR");
        assert_eq!(title, "raw title");
        assert_eq!(description, "raw description");
    }
}
