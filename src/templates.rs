use tera::Tera;

use crate::error::AppError;

const BASE_TEMPLATE: &str = include_str!("../templates/base.html");
const INDEX_TEMPLATE: &str = include_str!("../templates/index.html");

/// Initialize the Tera template engine.
///
/// Templates are compiled into the binary so the page renders regardless of the
/// working directory.
pub fn init_templates() -> Result<Tera, AppError> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        ("base.html", BASE_TEMPLATE),
        ("index.html", INDEX_TEMPLATE),
    ])?;
    Ok(tera)
}
