use serde::{Deserialize, Serialize};

/// One entry of the directory. Identity is `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: String,
    pub name: String,
    pub logo_url: String,
    pub industry: String,
    pub location: String,
    pub description: String,
}

impl Company {
    // Render the record as a single csv row (id, name, industry, location, description, logo)
    pub fn as_csv_row(&self) -> String {
        [
            &self.id,
            &self.name,
            &self.industry,
            &self.location,
            &self.description,
            &self.logo_url,
        ]
        .iter()
        .map(|c| Company::wrap_cell_content(c))
        .collect::<Vec<String>>()
        .join(",")
    }

    fn wrap_cell_content(c: &str) -> String {
        let needs_escaping = c.chars().any(|c| c == '"');
        let needs_wrapping = c.chars().any(|c| c == ' ' || c == '\t' || c == ',');
        let mut out = String::from(c);

        if needs_escaping {
            out = out.replace('"', "\"\"");
        }
        if needs_wrapping || needs_escaping {
            out = format!("\"{out}\"");
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortOrder::Ascending => "A-Z",
            SortOrder::Descending => "Z-A",
        }
    }
}

#[cfg(test)]
pub(crate) fn company(id: &str, name: &str, industry: &str, location: &str) -> Company {
    Company {
        id: id.to_string(),
        name: name.to_string(),
        logo_url: format!("https://logos.example.com/{id}.png"),
        industry: industry.to_string(),
        location: location.to_string(),
        description: format!("{name} does {industry} things in {location}."),
    }
}
