use super::catalog::{CatalogRecord, RecordId};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// An image that made it through transcode and publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigratedAsset {
    /// Destination storage key
    pub path: String,
    /// Public URL of the published object
    pub url: String,
    /// Display name derived from the record id and asset index
    pub name: String,
}

/// Document written to the destination catalog.
///
/// `migrado_el` is intentionally absent: the writer asks the destination store to
/// stamp it with its own clock at commit time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationRecord {
    pub source_id: RecordId,
    pub titulo: JsonValue,
    pub descripcion: JsonValue,
    pub anio: JsonValue,
    pub categoria: JsonValue,
    pub serie: JsonValue,
    pub tecnica: JsonValue,
    pub medidas: JsonValue,
    pub price: JsonValue,
    pub is_available: JsonValue,
    pub show_price: JsonValue,
    pub orden: JsonValue,
    pub imagenes: Vec<MigratedAsset>,
}

impl DestinationRecord {
    /// Copy the source attributes and replace the image list wholesale.
    ///
    /// Null or absent `is_available`, `show_price` and `orden` fall back to
    /// `true`, `false` and `0`; any other value is kept as the source stored it.
    pub fn assemble(record: &CatalogRecord, imagenes: Vec<MigratedAsset>) -> Self {
        let attrs = &record.attributes;
        Self {
            source_id: record.id.clone(),
            titulo: attrs.titulo.clone(),
            descripcion: attrs.descripcion.clone(),
            anio: attrs.anio.clone(),
            categoria: attrs.categoria.clone(),
            serie: attrs.serie.clone(),
            tecnica: attrs.tecnica.clone(),
            medidas: attrs.medidas.clone(),
            price: attrs.price.clone(),
            is_available: or_default(&attrs.is_available, JsonValue::Bool(true)),
            show_price: or_default(&attrs.show_price, JsonValue::Bool(false)),
            orden: or_default(&attrs.orden, JsonValue::from(0)),
            imagenes,
        }
    }
}

fn or_default(value: &JsonValue, default: JsonValue) -> JsonValue {
    if value.is_null() {
        default
    } else {
        value.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AssetRef;
    use serde_json::json;

    #[test]
    fn test_assemble_copies_attributes_and_replaces_images() {
        let record: CatalogRecord = serde_json::from_value(json!({
            "id": 7,
            "titulo": "Retrato",
            "anio": "1985",
            "price": 300,
            "is_available": false,
            "show_price": true,
            "orden": 4,
            "imagenes": [{"path": "a.jpg"}, {"path": "b.jpg"}]
        }))
        .unwrap();

        let migrated = vec![MigratedAsset {
            path: "obras/migracion_7_1_0.webp".to_string(),
            url: "https://cdn.example.com/obras/migracion_7_1_0.webp".to_string(),
            name: "migracion_7_0.webp".to_string(),
        }];

        let doc = DestinationRecord::assemble(&record, migrated.clone());
        assert_eq!(doc.source_id, RecordId::new("7"));
        assert_eq!(doc.titulo, json!("Retrato"));
        assert_eq!(doc.anio, json!("1985"));
        assert_eq!(doc.price, json!(300));
        assert_eq!(doc.is_available, json!(false));
        assert_eq!(doc.show_price, json!(true));
        assert_eq!(doc.orden, json!(4));
        assert_eq!(doc.imagenes, migrated);
    }

    #[test]
    fn test_assemble_applies_defaults() {
        let record = CatalogRecord::new(1i64, vec![AssetRef::new("x.jpg")]);
        let doc = DestinationRecord::assemble(&record, Vec::new());

        assert_eq!(doc.is_available, json!(true));
        assert_eq!(doc.show_price, json!(false));
        assert_eq!(doc.orden, json!(0));
        assert!(doc.imagenes.is_empty());
        assert_eq!(doc.categoria, JsonValue::Null);
    }

    #[test]
    fn test_assemble_keeps_non_null_values_verbatim() {
        let record: CatalogRecord = serde_json::from_value(json!({
            "id": 9,
            "titulo": 1998,
            "is_available": "true",
            "show_price": 0,
            "orden": 2.5
        }))
        .unwrap();

        let doc = DestinationRecord::assemble(&record, Vec::new());
        assert_eq!(doc.titulo, json!(1998));
        assert_eq!(doc.is_available, json!("true"));
        assert_eq!(doc.show_price, json!(0));
        assert_eq!(doc.orden, json!(2.5));
    }
}
