//! WMS 1.3.0

use crate::mapping::{
    boolean, computed, float, integer, many, one, text, FieldMapping, NestedMapping,
    SchemaMapping, ServiceType, WMS_NAMESPACE, XLINK_NAMESPACE,
};
use crate::parsers::{ParserKind, ReverseParserKind};

const NAMESPACES: &[(&str, &str)] = &[("wms", WMS_NAMESPACE), ("xlink", XLINK_NAMESPACE)];

fn keywords(base_xpath: &'static str) -> FieldMapping {
    many(
        "keywords",
        "Keyword",
        base_xpath,
        &["keyword"],
        vec![text("keyword", "text()")],
    )
}

fn contact() -> FieldMapping {
    one(
        "service_contact",
        "ServiceContact",
        "wms:Service/wms:ContactInformation",
        vec![
            text("person_name", "wms:ContactPersonPrimary/wms:ContactPerson/text()"),
            text("organization", "wms:ContactPersonPrimary/wms:ContactOrganization/text()"),
            text("position", "wms:ContactPosition/text()"),
            text("address_type", "wms:ContactAddress/wms:AddressType/text()"),
            text("address", "wms:ContactAddress/wms:Address/text()"),
            text("city", "wms:ContactAddress/wms:City/text()"),
            text("state_or_province", "wms:ContactAddress/wms:StateOrProvince/text()"),
            text("postal_code", "wms:ContactAddress/wms:PostCode/text()"),
            text("country", "wms:ContactAddress/wms:Country/text()"),
            text("phone", "wms:ContactVoiceTelephone/text()"),
            text("facsimile", "wms:ContactFacsimileTelephone/text()"),
            text("email", "wms:ContactElectronicMailAddress/text()"),
        ],
    )
}

fn operation_urls() -> FieldMapping {
    many(
        "operation_urls",
        "OperationUrl",
        "wms:Capability/wms:Request/*/wms:DCPType/wms:HTTP/*",
        &["operation", "method"],
        vec![
            text("operation", "local-name(../../..)"),
            text("method", "local-name()"),
            text("url", "wms:OnlineResource/@xlink:href"),
            many(
                "mime_types",
                "MimeType",
                "../../../wms:Format",
                &["mime_type"],
                vec![text("mime_type", "text()")],
            ),
        ],
    )
}

fn layers() -> FieldMapping {
    many(
        "layers",
        "Layer",
        "wms:Capability//wms:Layer",
        &["identifier"],
        vec![
            text("identifier", "wms:Name/text()"),
            text("parent_identifier", "../wms:Name/text()"),
            text("title", "wms:Title/text()"),
            text("abstract", "wms:Abstract/text()"),
            boolean("is_queryable", "@queryable"),
            boolean("is_opaque", "@opaque"),
            integer("cascaded", "@cascaded"),
            float("scale_min", "wms:MinScaleDenominator/text()"),
            float("scale_max", "wms:MaxScaleDenominator/text()"),
            computed(
                "bbox_lat_lon",
                &[
                    "wms:EX_GeographicBoundingBox/wms:westBoundLongitude/text()",
                    "wms:EX_GeographicBoundingBox/wms:southBoundLatitude/text()",
                    "wms:EX_GeographicBoundingBox/wms:eastBoundLongitude/text()",
                    "wms:EX_GeographicBoundingBox/wms:northBoundLatitude/text()",
                ],
                ParserKind::BoundingBoxFromCorners,
                Some(ReverseParserKind::BoundingBoxToCorners),
            ),
            many(
                "reference_systems",
                "ReferenceSystem",
                "wms:CRS",
                &[],
                vec![
                    computed("code", &["text()"], ParserKind::SridFromSrsName, None),
                    computed("prefix", &["text()"], ParserKind::AuthorityFromSrsName, None),
                ],
            ),
            many(
                "styles",
                "Style",
                "wms:Style",
                &["name"],
                vec![
                    text("name", "wms:Name/text()"),
                    text("title", "wms:Title/text()"),
                    text("legend_url", "wms:LegendURL/wms:OnlineResource/@xlink:href"),
                    integer("legend_width", "wms:LegendURL/@width"),
                    integer("legend_height", "wms:LegendURL/@height"),
                    text("legend_format", "wms:LegendURL/wms:Format/text()"),
                ],
            ),
            many(
                "dimensions",
                "Dimension",
                "wms:Dimension",
                &["name"],
                vec![
                    text("name", "@name"),
                    text("units", "@units"),
                    text("default", "@default"),
                    text("extent", "text()"),
                ],
            ),
            keywords("wms:KeywordList/wms:Keyword"),
        ],
    )
}

pub(crate) fn mapping() -> SchemaMapping {
    SchemaMapping {
        service_type: ServiceType::Wms,
        versions: &["1.3.0"],
        namespaces: NAMESPACES,
        root: NestedMapping {
            model: "Service",
            base_xpath: "/wms:WMS_Capabilities",
            many: false,
            key_fields: &[],
            fields: vec![
                text("version", "@version"),
                text("name", "wms:Service/wms:Name/text()"),
                computed(
                    "service_type",
                    &["wms:Service/wms:Name/text()"],
                    ParserKind::ServiceTypeFromName,
                    None,
                ),
                text("title", "wms:Service/wms:Title/text()"),
                text("abstract", "wms:Service/wms:Abstract/text()"),
                text("fees", "wms:Service/wms:Fees/text()"),
                text("access_constraints", "wms:Service/wms:AccessConstraints/text()"),
                text("online_resource", "wms:Service/wms:OnlineResource/@xlink:href"),
                integer("layer_limit", "wms:Service/wms:LayerLimit/text()"),
                integer("max_width", "wms:Service/wms:MaxWidth/text()"),
                integer("max_height", "wms:Service/wms:MaxHeight/text()"),
                keywords("wms:Service/wms:KeywordList/wms:Keyword"),
                contact(),
                operation_urls(),
                layers(),
            ],
        },
    }
}
