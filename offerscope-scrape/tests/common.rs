#![allow(dead_code)]

use offerscope_common::observability::{LogConfig, LogFormat};
use offerscope_http::ISO_8859_15;
use std::sync::OnceLock;

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "offerscope-tests",
            emit_stderr: true,
            format: LogFormat::Text,
            default_filter: "debug".to_string(),
            log_dir: Some(std::env::temp_dir().join("offerscope-tests")),
        };
        offerscope_common::observability::init_logging(config).unwrap_or_default()
    });
}

/// Encode like the board does.
pub fn latin9(text: &str) -> Vec<u8> {
    let (bytes, _, unmappable) = ISO_8859_15.encode(text);
    assert!(!unmappable, "fixture has characters outside ISO-8859-15");
    bytes.into_owned()
}

pub fn listing_page(ids: &[&str]) -> String {
    let rows: String = ids
        .iter()
        .map(|id| {
            format!(
                "<tr id=\"{id}\">\
                 <td>Offre {id}</td><td> Société {id} </td><td>Zürich</td><td></td>\
                 <td>STG-{id}</td><td>master project or Internship</td><td>4</td><td>2</td>\
                 <td>To find (if master project)</td><td>12.09.2024</td></tr>"
            )
        })
        .collect();
    format!(
        "<html><body><table>\
         <tr><th>Titre</th><th>Entreprise</th><th>Lieu</th><th>Label</th><th>No</th>\
         <th>Format</th><th>Inscrits</th><th>Places</th><th>Professeur</th><th>Date</th></tr>\
         {rows}</table></body></html>"
    )
}

pub fn detail_page(salary: &str) -> String {
    format!(
        r#"<html><body><div>
<detail c_detailmodele="STAGE_LABEL_DUREEND1"><b>Durée</b></detail>
<div> <span>2 - 3 mois</span></div>
<detail c_detailmodele="DETSTAGE_CHK_P1"><b>P1</b><span>Été 2025</span></detail>
<detail c_detailmodele="DETSTAGE_CHK_P2"><b>P2</b><span></span></detail>
<detail c_detailmodele="DETSTAGE_CHK_P3"><b>P3</b><span></span></detail>
<detail c_detailmodele="STAGE_LABEL_SALAIRE"><b>Salaire</b></detail>
<div> <span>{salary}</span></div>
<detail c_detailmodele="STAGE_LABEL_BENEF"><b>Avantages</b></detail>
<div> <span>Abonnement CFF</span></div>
<detail c_detailmodele="STAGE_LABEL_DESCRIPTION"><b>Description</b></detail>
<div> <span>Réseaux électriques</span></div>
<detail c_detailmodele="STAGE_LABEL_CONN_REQU"><b>Connaissances</b></detail>
<div> <span>Python</span></div>
<detail c_detailmodele="STAGE_LABEL_RMQ"><b>Remarques</b></detail>
<div></div>
<detail c_detailmodele="STAGE_ETIQ_LANGUEFRANCAIS"><b>Français</b><span>C1</span></detail>
<detail c_detailmodele="STAGE_ETIQ_LANGUEANGLAIS"><b>Anglais</b><span>B2</span></detail>
<detail c_detailmodele="STAGE_ETIQ_LANGUEALLEMAND"><b>Allemand</b><span>A2</span></detail>
<detail c_detailmodele="DET_STAGE_LAB_SECTIONS"><b>Sections</b></detail>
<div> <span>Génie électrique</span></div>
<detail c_detailmodele="CODE21916719"></detail>
</div></body></html>"#
    )
}
