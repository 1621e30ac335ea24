use anyhow::Result;
use contracts::domain::a001_cabinet::Cabinet;
use contracts::shared::sheet_row::PLACEHOLDER;
use serde_json::Value;
use std::collections::HashMap;

use super::moysklad_api_client::MoySkladApiClient;
use super::processors::normalize;

/// Нормализованные реквизиты товара
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub name: String,
    pub article: String,
    pub code: String,
}

impl Product {
    pub fn placeholder() -> Self {
        Self {
            name: PLACEHOLDER.to_string(),
            article: PLACEHOLDER.to_string(),
            code: PLACEHOLDER.to_string(),
        }
    }

    pub fn from_json(json: &Value, trim: bool) -> Self {
        Self {
            name: normalize::text(json.get("name"), trim),
            article: normalize::text(json.get("article"), trim),
            code: normalize::text(json.get("code"), trim),
        }
    }
}

/// Кэш товаров одного кабинета (ключ - href товара)
///
/// Создаётся на время обработки кабинета и общий для проходов по заказам и отгрузкам.
#[derive(Debug, Default)]
pub struct ProductCache {
    products: HashMap<String, Product>,
}

impl ProductCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, href: &str) -> Option<&Product> {
        self.products.get(href)
    }

    pub fn insert(&mut self, href: String, product: Product) {
        self.products.insert(href, product);
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// Получить товар позиции: из кэша или одним запросом к API
///
/// Позиция без href даёт товар-заглушку без запроса.
pub async fn resolve_product(
    client: &MoySkladApiClient,
    cabinet: &Cabinet,
    cache: &mut ProductCache,
    href: Option<&str>,
    trim: bool,
) -> Result<Product> {
    let Some(href) = href.filter(|h| !h.trim().is_empty()) else {
        return Ok(Product::placeholder());
    };

    if let Some(product) = cache.get(href) {
        return Ok(product.clone());
    }

    let json = client.fetch_product(cabinet, href).await?;
    let product = Product::from_json(&json, trim);
    cache.insert(href.to_string(), product.clone());
    Ok(product)
}
