//! Record types shared by the unit tests.

use chrono::{DateTime, NaiveDate, Utc};

use crate::{AnyRecord, Record, RecordType, Reference, Schema};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Account {
    pub id: Option<String>,
    pub name: Option<String>,
    pub industry: Option<String>,
    pub annual_revenue: Option<f64>,
    pub created_date: Option<DateTime<Utc>>,
    pub contacts: Vec<Contact>,
    pub dirty: bool,
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
        schema
            .field::<Option<f64>>("annual_revenue")
            .get(|a| a.annual_revenue)
            .set(|a, v| a.annual_revenue = v);
        schema
            .field::<Option<DateTime<Utc>>>("created_date")
            .get(|a| a.created_date)
            .set(|a, v| a.created_date = v)
            .read_only();
        schema
            .records::<Contact>("contacts")
            .get(|a| a.contacts.clone())
            .set(|a, v| a.contacts = v)
            .children();
        schema
            .field::<bool>("dirty")
            .get(|a| a.dirty)
            .set(|a, v| a.dirty = v)
            .transient();
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Audit {
    pub owner_id: Option<String>,
    pub last_modified_date: Option<DateTime<Utc>>,
}

impl Record for Audit {
    fn declare(schema: &mut Schema<Self>) {
        schema
            .field::<Option<String>>("owner_id")
            .get(|a| a.owner_id.clone())
            .set(|a, v| a.owner_id = v);
        schema
            .field::<Option<DateTime<Utc>>>("last_modified_date")
            .get(|a| a.last_modified_date)
            .set(|a, v| a.last_modified_date = v);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contact {
    pub id: Option<String>,
    pub audit: Audit,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub account_id: Option<Reference>,
    pub account: Option<Account>,
}

impl Record for Contact {
    fn declare(schema: &mut Schema<Self>) {
        schema.attributes();
        schema
            .field::<Option<String>>("id")
            .get(|c| c.id.clone())
            .set(|c, v| c.id = v)
            .read_only();
        schema.inherit::<Audit>(|c| &c.audit, |c| &mut c.audit);
        schema
            .field::<Option<String>>("first_name")
            .get(|c| c.first_name.clone())
            .set(|c, v| c.first_name = v);
        schema
            .field::<Option<String>>("last_name")
            .get(|c| c.last_name.clone())
            .set(|c, v| c.last_name = v);
        schema
            .field::<Option<String>>("email")
            .get(|c| c.email.clone())
            .set(|c, v| c.email = v);
        schema
            .field::<Option<Reference>>("account_id")
            .get(|c| c.account_id.clone())
            .set(|c, v| c.account_id = v);
        schema
            .record::<Account>("account")
            .get(|c| c.account.clone())
            .set(|c, v| c.account = v)
            .parent()
            .read_only();
        schema
            .field::<Option<DateTime<Utc>>>("last_modified_date")
            .get(|c| c.audit.last_modified_date)
            .set(|c, v| c.audit.last_modified_date = v)
            .read_only();
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Opportunity {
    pub id: Option<String>,
    pub name: Option<String>,
    pub amount: Option<f64>,
    pub close_date: Option<NaiveDate>,
}

impl Record for Opportunity {
    fn declare(schema: &mut Schema<Self>) {
        schema.attributes();
        schema
            .field::<Option<String>>("id")
            .get(|o| o.id.clone())
            .set(|o, v| o.id = v)
            .read_only();
        schema
            .field::<Option<String>>("name")
            .get(|o| o.name.clone())
            .set(|o, v| o.name = v);
        schema
            .field::<Option<f64>>("amount")
            .get(|o| o.amount)
            .set(|o, v| o.amount = v);
        schema
            .field::<Option<NaiveDate>>("close_date")
            .get(|o| o.close_date)
            .set(|o, v| o.close_date = v);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lead {
    pub id: Option<String>,
    pub name: Option<String>,
    pub company: Option<String>,
}

impl Record for Lead {
    fn declare(schema: &mut Schema<Self>) {
        schema.attributes();
        schema
            .field::<Option<String>>("id")
            .get(|l| l.id.clone())
            .set(|l, v| l.id = v)
            .read_only();
        schema
            .field::<Option<String>>("name")
            .get(|l| l.name.clone())
            .set(|l, v| l.name = v);
        schema
            .field::<Option<String>>("company")
            .get(|l| l.company.clone())
            .set(|l, v| l.company = v);
    }
}

/// Abstract base for anything a task can be "about".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Named;

impl Record for Named {
    fn declare(_schema: &mut Schema<Self>) {}

    fn is_abstract() -> bool {
        true
    }

    fn subtypes() -> Vec<RecordType> {
        vec![RecordType::of::<Account>(), RecordType::of::<Opportunity>()]
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Task {
    pub id: Option<String>,
    pub subject: Option<String>,
    pub what: Option<AnyRecord>,
    pub who: Option<AnyRecord>,
    pub activity_date: Option<NaiveDate>,
}

impl Record for Task {
    fn declare(schema: &mut Schema<Self>) {
        schema.attributes();
        schema
            .field::<Option<String>>("id")
            .get(|t| t.id.clone())
            .set(|t, v| t.id = v)
            .read_only();
        schema
            .field::<Option<String>>("subject")
            .get(|t| t.subject.clone())
            .set(|t, v| t.subject = v);
        schema
            .any_record::<Named>("what")
            .get(|t| t.what.clone())
            .set(|t, v| t.what = v)
            .parent()
            .read_only();
        schema
            .polymorphic("who")
            .candidates([RecordType::of::<Contact>(), RecordType::of::<Lead>()])
            .get(|t| t.who.clone())
            .set(|t, v| t.who = v)
            .parent()
            .read_only();
        schema
            .field::<Option<NaiveDate>>("activity_date")
            .get(|t| t.activity_date)
            .set(|t, v| t.activity_date = v);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ordered {
    pub alpha: Option<String>,
    pub beta: Option<String>,
    pub kind: Option<String>,
}

impl Record for Ordered {
    fn declare(schema: &mut Schema<Self>) {
        schema
            .field::<Option<String>>("alpha")
            .get(|o| o.alpha.clone())
            .set(|o, v| o.alpha = v);
        schema
            .field::<Option<String>>("beta")
            .get(|o| o.beta.clone())
            .set(|o, v| o.beta = v);
        schema
            .field::<Option<String>>("kind")
            .get(|o| o.kind.clone())
            .set(|o, v| o.kind = v)
            .first();
        schema.attributes();
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Invoice {
    pub name: Option<String>,
    pub amount: Option<f64>,
    pub issued: Option<NaiveDate>,
}

impl Record for Invoice {
    fn declare(schema: &mut Schema<Self>) {
        schema.custom().attributes();
        schema
            .field::<Option<String>>("name")
            .get(|i| i.name.clone())
            .set(|i, v| i.name = v);
        schema
            .field::<Option<f64>>("amount")
            .get(|i| i.amount)
            .set(|i, v| i.amount = v)
            .custom();
        schema
            .field::<Option<NaiveDate>>("issued")
            .get(|i| i.issued)
            .set(|i, v| i.issued = v)
            .wire("Issued_On__c");
    }
}

/// `{Id, Name}` plus a parent-to-child collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parent {
    pub id: Option<String>,
    pub name: Option<String>,
    pub children: Vec<Child>,
}

impl Record for Parent {
    fn declare(schema: &mut Schema<Self>) {
        schema
            .field::<Option<String>>("id")
            .get(|p| p.id.clone())
            .set(|p, v| p.id = v);
        schema
            .field::<Option<String>>("name")
            .get(|p| p.name.clone())
            .set(|p, v| p.name = v);
        schema
            .records::<Child>("children")
            .get(|p| p.children.clone())
            .set(|p, v| p.children = v)
            .children();
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Child {
    pub id: Option<String>,
    pub label: Option<String>,
}

impl Record for Child {
    fn declare(schema: &mut Schema<Self>) {
        schema
            .field::<Option<String>>("id")
            .get(|c| c.id.clone())
            .set(|c, v| c.id = v);
        schema
            .field::<Option<String>>("label")
            .get(|c| c.label.clone())
            .set(|c, v| c.label = v);
    }
}

/// Self-referential tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    pub id: Option<String>,
    pub parent: Option<Box<Node>>,
    pub children: Vec<Node>,
}

impl Record for Node {
    fn declare(schema: &mut Schema<Self>) {
        schema
            .field::<Option<String>>("id")
            .get(|n| n.id.clone())
            .set(|n, v| n.id = v);
        schema
            .record::<Node>("parent")
            .get(|n| n.parent.as_deref().cloned())
            .set(|n, v| n.parent = v.map(Box::new))
            .parent();
        schema
            .records::<Node>("children")
            .get(|n| n.children.clone())
            .set(|n, v| n.children = v)
            .children();
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleA {
    pub name: Option<String>,
    pub b: Option<Box<CycleB>>,
}

impl Record for CycleA {
    fn declare(schema: &mut Schema<Self>) {
        schema
            .field::<Option<String>>("name")
            .get(|a| a.name.clone())
            .set(|a, v| a.name = v);
        schema
            .record::<CycleB>("b")
            .get(|a| a.b.as_deref().cloned())
            .set(|a, v| a.b = v.map(Box::new))
            .parent();
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleB {
    pub name: Option<String>,
    pub a: Option<Box<CycleA>>,
}

impl Record for CycleB {
    fn declare(schema: &mut Schema<Self>) {
        schema
            .field::<Option<String>>("name")
            .get(|b| b.name.clone())
            .set(|b, v| b.name = v);
        schema
            .record::<CycleA>("a")
            .get(|b| b.a.as_deref().cloned())
            .set(|b, v| b.a = v.map(Box::new))
            .parent();
    }
}

/// Narrow projection of [`Account`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountSummary {
    pub id: Option<String>,
    pub name: Option<String>,
}

impl Record for AccountSummary {
    fn declare(schema: &mut Schema<Self>) {
        schema
            .field::<Option<String>>("id")
            .get(|a| a.id.clone())
            .set(|a, v| a.id = v);
        schema
            .field::<Option<String>>("name")
            .get(|a| a.name.clone())
            .set(|a, v| a.name = v);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DuplicateWire {
    pub name: Option<String>,
    pub label: Option<String>,
}

impl Record for DuplicateWire {
    fn declare(schema: &mut Schema<Self>) {
        schema
            .field::<Option<String>>("name")
            .get(|d| d.name.clone())
            .set(|d, v| d.name = v);
        schema
            .field::<Option<String>>("label")
            .get(|d| d.label.clone())
            .set(|d, v| d.label = v)
            .wire("Name");
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Unreachable {
    pub ghost: Option<String>,
}

impl Record for Unreachable {
    fn declare(schema: &mut Schema<Self>) {
        schema.field::<Option<String>>("ghost");
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OneWay {
    pub computed: Option<String>,
    pub secret: Option<String>,
}

impl Record for OneWay {
    fn declare(schema: &mut Schema<Self>) {
        schema
            .field::<Option<String>>("computed")
            .get(|o| o.computed.clone());
        schema
            .field::<Option<String>>("secret")
            .set(|o, v| o.secret = v);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoCandidates {
    pub target: Option<AnyRecord>,
}

impl Record for NoCandidates {
    fn declare(schema: &mut Schema<Self>) {
        schema
            .polymorphic("target")
            .get(|n| n.target.clone())
            .set(|n, v| n.target = v);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AbstractTyped {
    pub what: Option<Named>,
}

impl Record for AbstractTyped {
    fn declare(schema: &mut Schema<Self>) {
        schema
            .record::<Named>("what")
            .get(|a| a.what.clone())
            .set(|a, v| a.what = v);
    }
}

/// A second type that claims the `Account` wire name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountAlias {
    pub id: Option<String>,
}

impl Record for AccountAlias {
    fn declare(schema: &mut Schema<Self>) {
        schema.wire_name("Account");
        schema
            .field::<Option<String>>("id")
            .get(|a| a.id.clone())
            .set(|a, v| a.id = v);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Colliding {
    pub target: Option<AnyRecord>,
}

impl Record for Colliding {
    fn declare(schema: &mut Schema<Self>) {
        schema
            .polymorphic("target")
            .candidates([RecordType::of::<Account>(), RecordType::of::<AccountAlias>()])
            .get(|c| c.target.clone())
            .set(|c, v| c.target = v);
    }
}

/// Valid on its own, but its polymorphic candidate fails to build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrokenCandidate {
    pub target: Option<AnyRecord>,
}

impl Record for BrokenCandidate {
    fn declare(schema: &mut Schema<Self>) {
        schema
            .polymorphic("target")
            .candidates([RecordType::of::<Account>(), RecordType::of::<DuplicateWire>()])
            .get(|b| b.target.clone())
            .set(|b, v| b.target = v);
    }
}

/// Overrides an `Audit` field before inheriting the rest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Revision {
    pub audit: Audit,
    pub last_modified_date: Option<DateTime<Utc>>,
}

impl Record for Revision {
    fn declare(schema: &mut Schema<Self>) {
        schema
            .field::<Option<DateTime<Utc>>>("last_modified_date")
            .get(|r| r.last_modified_date)
            .set(|r, v| r.last_modified_date = v)
            .read_only();
        schema.inherit::<Audit>(|r| &r.audit, |r| &mut r.audit);
    }
}
