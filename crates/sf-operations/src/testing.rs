//! Record types shared by the unit tests.

use busbar_sf_mapping::{Record, Schema};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Account {
    pub id: Option<String>,
    pub name: Option<String>,
    pub industry: Option<String>,
}

impl Record for Account {
    fn declare(schema: &mut Schema<Self>) {
        schema.attributes();
        schema
            .field::<Option<String>>("id")
            .get(|a| a.id.clone())
            .set(|a, v| a.id = v)
            .read_only();
        schema
            .field::<Option<String>>("name")
            .get(|a| a.name.clone())
            .set(|a, v| a.name = v);
        schema
            .field::<Option<String>>("industry")
            .get(|a| a.industry.clone())
            .set(|a, v| a.industry = v);
    }
}

/// Projection of [`Account`] onto its name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountName {
    pub name: Option<String>,
}

impl Record for AccountName {
    fn declare(schema: &mut Schema<Self>) {
        schema
            .field::<Option<String>>("name")
            .get(|a| a.name.clone())
            .set(|a, v| a.name = v);
    }
}

/// Declares the same wire name twice; every lookup fails.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Broken {
    pub name: Option<String>,
}

impl Record for Broken {
    fn declare(schema: &mut Schema<Self>) {
        schema
            .field::<Option<String>>("name")
            .get(|b| b.name.clone())
            .set(|b, v| b.name = v);
        schema
            .field::<Option<String>>("label")
            .get(|b| b.name.clone())
            .wire("Name");
    }
}
