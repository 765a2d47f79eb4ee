//! XML representations posted to the REST API.

use std::borrow::Cow;
use std::fmt::Write;

use crate::config::{ConfigError, DatastoreConfig, LayerConfig};

/// Station POI join shipped with the crate.
pub const BUNDLED_VIEW_SQL: &str = include_str!("../../sql/station_pois.sql");

/// Metadata key GeoServer stores virtual table definitions under.
const VIRTUAL_TABLE_KEY: &str = "JDBC_VIRTUAL_TABLE";

/// Resolve the SQL behind the layer's virtual table.
pub fn view_sql(layer: &LayerConfig) -> Result<String, ConfigError> {
    match &layer.sql_file {
        Some(path) => {
            let sql = std::fs::read_to_string(path).map_err(|e| ConfigError::SqlFile {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
            if sql.trim().is_empty() {
                return Err(ConfigError::SqlFile {
                    path: path.display().to_string(),
                    reason: "file is empty".to_string(),
                });
            }
            Ok(sql.trim().to_string())
        }
        None => Ok(BUNDLED_VIEW_SQL.trim().to_string()),
    }
}

/// Escape text for use in XML element content or attribute values.
pub fn escape_xml(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

pub fn workspace_xml(name: &str) -> String {
    format!("<workspace><name>{}</name></workspace>", escape_xml(name))
}

pub fn namespace_xml(prefix: &str, uri: &str) -> String {
    format!(
        "<namespace><prefix>{}</prefix><uri>{}</uri></namespace>",
        escape_xml(prefix),
        escape_xml(uri)
    )
}

/// JNDI-backed PostGIS store inside `workspace`.
pub fn datastore_xml(datastore: &DatastoreConfig, workspace: &str) -> String {
    let mut xml = String::new();
    // Writing to a String cannot fail.
    let _ = write!(
        xml,
        r#"<dataStore>
  <name>{name}</name>
  <type>PostGIS (JNDI)</type>
  <enabled>true</enabled>
  <workspace>
    <name>{workspace}</name>
  </workspace>
  <connectionParameters>
    <entry key="dbtype">postgis</entry>
    <entry key="jndiReferenceName">{jndi}</entry>
  </connectionParameters>
</dataStore>
"#,
        name = escape_xml(&datastore.name),
        workspace = escape_xml(workspace),
        jndi = escape_xml(&datastore.jndi_reference),
    );
    xml
}

/// Feature type whose features come from `sql`.
pub fn feature_type_xml(layer: &LayerConfig, sql: &str) -> String {
    let name = escape_xml(&layer.name);
    let mut xml = String::new();
    let _ = write!(
        xml,
        r#"<featureType>
  <name>{name}</name>
  <nativeName>{name}</nativeName>
  <title>{title}</title>
  <enabled>true</enabled>
  <srs>EPSG:{srid}</srs>
  <metadata>
    <entry key="{key}">
      <virtualTable>
        <name>{name}</name>
        <sql>{sql}</sql>
        <escapeSql>false</escapeSql>
        <geometry>
          <name>{geometry}</name>
          <type>{geometry_type}</type>
          <srid>{srid}</srid>
        </geometry>
        <keyColumn>{key_column}</keyColumn>
      </virtualTable>
    </entry>
  </metadata>
</featureType>
"#,
        name = name,
        title = escape_xml(&layer.title),
        srid = layer.srid,
        key = VIRTUAL_TABLE_KEY,
        sql = escape_xml(sql),
        geometry = escape_xml(&layer.geometry_column),
        geometry_type = layer.geometry_type,
        key_column = escape_xml(&layer.key_column),
    );
    xml
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeometryType;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("plain"), "plain");
        assert!(matches!(escape_xml("plain"), Cow::Borrowed(_)));
        assert_eq!(
            escape_xml(r#"a < b && c > 'd' "e""#),
            "a &lt; b &amp;&amp; c &gt; &apos;d&apos; &quot;e&quot;"
        );
    }

    #[test]
    fn test_workspace_and_namespace_xml() {
        assert_eq!(
            workspace_xml("station_pois"),
            "<workspace><name>station_pois</name></workspace>"
        );
        assert_eq!(
            namespace_xml("station_pois", "http://localhost:8080/geoserver/station_pois"),
            "<namespace><prefix>station_pois</prefix>\
             <uri>http://localhost:8080/geoserver/station_pois</uri></namespace>"
        );
    }

    #[test]
    fn test_datastore_xml_references_workspace_and_jndi() {
        let xml = datastore_xml(&DatastoreConfig::default(), "station_pois");
        assert!(xml.contains("<name>station_pois</name>"));
        assert!(xml.contains("<type>PostGIS (JNDI)</type>"));
        assert!(xml.contains("<workspace>\n    <name>station_pois</name>"));
        assert!(xml.contains(r#"<entry key="dbtype">postgis</entry>"#));
        assert!(xml.contains(
            r#"<entry key="jndiReferenceName">java:comp/env/jdbc/postgres</entry>"#
        ));
    }

    #[test]
    fn test_feature_type_xml_embeds_virtual_table() {
        let layer = LayerConfig {
            geometry_type: GeometryType::Polygon,
            srid: 3857,
            ..LayerConfig::default()
        };
        let xml = feature_type_xml(&layer, "SELECT * FROM t WHERE a < 3");
        assert!(xml.contains("<nativeName>station_pois</nativeName>"));
        assert!(xml.contains("<title>Station POIs</title>"));
        assert!(xml.contains("<srs>EPSG:3857</srs>"));
        assert!(xml.contains(r#"<entry key="JDBC_VIRTUAL_TABLE">"#));
        assert!(xml.contains("<sql>SELECT * FROM t WHERE a &lt; 3</sql>"));
        assert!(xml.contains("<escapeSql>false</escapeSql>"));
        assert!(xml.contains("<type>Polygon</type>"));
        assert!(xml.contains("<srid>3857</srid>"));
        assert!(xml.contains("<keyColumn>gas_station_id</keyColumn>"));
    }

    #[test]
    fn test_bundled_sql_escaped_in_payload() {
        let sql = view_sql(&LayerConfig::default()).unwrap();
        assert!(sql.starts_with("SELECT"));
        assert!(sql.contains("WHERE an.geometry IS NOT NULL"));

        let xml = feature_type_xml(&LayerConfig::default(), &sql);
        assert!(xml.contains("WHEN &apos;Sở hữu&apos; THEN 0"));
        assert!(!xml.contains("'Fuel'"));
    }

    #[test]
    fn test_view_sql_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "\nSELECT id, geom FROM parcels\n").unwrap();

        let layer = LayerConfig {
            sql_file: Some(file.path().to_path_buf()),
            ..LayerConfig::default()
        };
        assert_eq!(view_sql(&layer).unwrap(), "SELECT id, geom FROM parcels");
    }

    #[test]
    fn test_view_sql_missing_file() {
        let layer = LayerConfig {
            sql_file: Some("/nonexistent/view.sql".into()),
            ..LayerConfig::default()
        };
        assert!(matches!(view_sql(&layer), Err(ConfigError::SqlFile { .. })));
    }
}
