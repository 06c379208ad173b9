//! Event contacts: people met on a shift (planners, vendors, clients).

use serde_json::{json, Value};

use super::{best_name_match, ExecContext};
use crate::agent_core::actions::{
    AddContactArgs, ContactAction, ContactRef, ContactsForShiftArgs, DeleteContactArgs,
    EditContactArgs, SearchContactsArgs, SetFavoriteArgs,
};
use crate::agent_core::errors::DispatchError;
use crate::agent_core::types::ActionOutcome;
use crate::store::{text, Row, Table};

/// Columns a free-text contact search looks at.
const SEARCH_COLUMNS: &[&str] = &["name", "company", "role", "custom_role", "email", "phone", "notes"];

pub async fn execute(ctx: &ExecContext, action: ContactAction) -> Result<ActionOutcome, DispatchError> {
    match action {
        ContactAction::Add(args) => add_contact(ctx, args).await,
        ContactAction::Edit(args) => edit_contact(ctx, args).await,
        ContactAction::Delete(args) => delete_contact(ctx, args).await,
        ContactAction::Search(args) => search_contacts(ctx, args).await,
        ContactAction::ForShift(args) => contacts_for_shift(ctx, args).await,
        ContactAction::SetFavorite(args) => set_favorite(ctx, args).await,
    }
}

fn contact_name(contact: &Row) -> &str {
    text(contact, "name").unwrap_or("contact")
}

async fn find_contact(ctx: &ExecContext, contact: &ContactRef) -> Result<Row, DispatchError> {
    if let Some(id) = contact.contact_id.as_deref() {
        return ctx
            .first(ctx.query(Table::Contacts).eq("id", id))
            .await?
            .ok_or_else(|| DispatchError::not_found(format!("No contact found with id {id}")));
    }
    let Some(name) = contact.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) else {
        return Err(DispatchError::validation("contactId or name is required"));
    };
    let candidates = ctx
        .select(&ctx.query(Table::Contacts).ilike("name", name).order_by("created_at", true))
        .await?;
    best_name_match(candidates, "name", name)
        .ok_or_else(|| DispatchError::not_found(format!("No contact found matching \"{name}\"")))
}

/// The id of the caller's shift on `date`, if exactly one exists.
async fn shift_id_on(ctx: &ExecContext, date: &str) -> Result<String, DispatchError> {
    let shifts = ctx
        .select(&ctx.query(Table::Shifts).eq("date", date))
        .await?;
    match shifts.as_slice() {
        [] => Err(DispatchError::not_found(format!("No shift found on {date}"))),
        [shift] => text(shift, "id")
            .map(str::to_string)
            .ok_or_else(|| DispatchError::not_found(format!("No shift found on {date}"))),
        _ => Err(DispatchError::validation(format!(
            "You have {} shifts on {date}. Say which one the contact belongs to.",
            shifts.len()
        ))),
    }
}

/// `id`, provided it names one of the caller's shifts.
async fn owned_shift_id(ctx: &ExecContext, id: String) -> Result<String, DispatchError> {
    match ctx.first(ctx.query(Table::Shifts).eq("id", id.as_str())).await? {
        Some(_) => Ok(id),
        None => Err(DispatchError::not_found(format!("No shift found with id {id}"))),
    }
}

fn id_filter(ctx: &ExecContext, contact: &Row) -> crate::store::Query {
    ctx.query(Table::Contacts)
        .eq("id", contact.get("id").cloned().unwrap_or(Value::Null))
}

// ─── Operations ─────────────────────────────────────────────────────────────

async fn add_contact(ctx: &ExecContext, args: AddContactArgs) -> Result<ActionOutcome, DispatchError> {
    let name = args
        .fields
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| DispatchError::validation("A contact needs a name"))?
        .to_string();

    let shift_id = match (args.shift_id, args.shift_date.as_deref()) {
        (Some(id), _) => Some(owned_shift_id(ctx, id).await?),
        (None, Some(date)) => Some(shift_id_on(ctx, date).await?),
        (None, None) => None,
    };

    let mut row = args.fields.to_columns();
    row.insert("name".into(), json!(name));
    row.insert("is_favorite".into(), json!(false));
    if let Some(id) = &shift_id {
        row.insert("shift_id".into(), json!(id));
    }
    let saved = ctx.insert(Table::Contacts, row).await?;

    let role = text(&saved, "custom_role")
        .or_else(|| text(&saved, "role"))
        .map(|r| format!(" ({})", r.replace('_', " ")))
        .unwrap_or_default();
    let message = match &args.shift_date {
        Some(date) => format!("✅ Saved {name}{role} to your shift on {date}."),
        None => format!("✅ Saved {name}{role} to your contacts."),
    };
    Ok(ActionOutcome::done(message, json!({ "contact": saved })))
}

async fn edit_contact(ctx: &ExecContext, args: EditContactArgs) -> Result<ActionOutcome, DispatchError> {
    let contact = find_contact(ctx, &args.contact).await?;
    let patch = args.updates.to_columns();
    if patch.is_empty() {
        return Err(DispatchError::validation("No changes were given for the contact"));
    }
    let saved = ctx
        .store
        .update(&id_filter(ctx, &contact), &patch)
        .await?
        .into_iter()
        .next()
        .unwrap_or(contact);
    Ok(ActionOutcome::done(
        format!("✅ Updated {}.", contact_name(&saved)),
        json!({ "contact": saved }),
    ))
}

async fn delete_contact(ctx: &ExecContext, args: DeleteContactArgs) -> Result<ActionOutcome, DispatchError> {
    let contact = find_contact(ctx, &args.contact).await?;
    let name = contact_name(&contact).to_string();
    if !args.confirmed {
        return Ok(ActionOutcome::confirm(
            format!("Are you sure you want to delete {name} from your contacts?"),
            json!({ "contact": contact }),
        ));
    }
    ctx.store.delete(&id_filter(ctx, &contact)).await?;
    Ok(ActionOutcome::done(format!("Deleted {name} from your contacts."), Value::Null))
}

async fn search_contacts(ctx: &ExecContext, args: SearchContactsArgs) -> Result<ActionOutcome, DispatchError> {
    let mut q = ctx.query(Table::Contacts);
    if let Some(company) = args.company.as_deref().filter(|c| !c.trim().is_empty()) {
        q = q.ilike("company", company.trim());
    }
    let mut contacts = ctx.select(&q.order_by("name", true)).await?;

    if let Some(role) = args.role.as_deref().filter(|r| !r.trim().is_empty()) {
        let role = role.trim().to_lowercase().replace(' ', "_");
        contacts.retain(|c| {
            text(c, "role") == Some(role.as_str())
                || text(c, "custom_role").is_some_and(|r| r.to_lowercase().replace(' ', "_") == role)
        });
    }
    if let Some(needle) = args.query.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        let needle = needle.to_lowercase();
        contacts.retain(|c| {
            SEARCH_COLUMNS
                .iter()
                .any(|col| text(c, col).is_some_and(|v| v.to_lowercase().contains(&needle)))
        });
    }

    let message = match contacts.len() {
        0 => "No contacts matched.".to_string(),
        1 => "Found 1 contact.".to_string(),
        n => format!("Found {n} contacts."),
    };
    Ok(ActionOutcome::done(
        message,
        json!({ "count": contacts.len(), "contacts": contacts }),
    ))
}

async fn contacts_for_shift(ctx: &ExecContext, args: ContactsForShiftArgs) -> Result<ActionOutcome, DispatchError> {
    let shift_id = match (args.shift_id, args.date.as_deref()) {
        (Some(id), _) => id,
        (None, Some(date)) => shift_id_on(ctx, date).await?,
        (None, None) => return Err(DispatchError::validation("shiftId or date is required")),
    };
    let contacts = ctx
        .select(
            &ctx.query(Table::Contacts)
                .eq("shift_id", shift_id.as_str())
                .order_by("name", true),
        )
        .await?;
    let message = if contacts.is_empty() {
        "No contacts are saved for that shift.".to_string()
    } else {
        format!("{} contacts from that shift.", contacts.len())
    };
    Ok(ActionOutcome::done(
        message,
        json!({ "shiftId": shift_id, "count": contacts.len(), "contacts": contacts }),
    ))
}

async fn set_favorite(ctx: &ExecContext, args: SetFavoriteArgs) -> Result<ActionOutcome, DispatchError> {
    let contact = find_contact(ctx, &args.contact).await?;
    let mut patch = Row::new();
    patch.insert("is_favorite".into(), json!(args.is_favorite));
    let saved = ctx
        .store
        .update(&id_filter(ctx, &contact), &patch)
        .await?
        .into_iter()
        .next()
        .unwrap_or(contact);
    let name = contact_name(&saved);
    let message = if args.is_favorite {
        format!("⭐ {name} is now a favorite.")
    } else {
        format!("{name} was removed from favorites.")
    };
    Ok(ActionOutcome::done(message, json!({ "contact": saved })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent_core::actions::Action;
    use crate::agent_core::catalog::ActionName;
    use crate::executors::test_support::*;
    use crate::store::flag;

    async fn run(ctx: &ExecContext, name: ActionName, args: Value) -> Result<ActionOutcome, DispatchError> {
        match Action::parse(name, args)? {
            Action::Contact(a) => execute(ctx, a).await,
            other => panic!("not a contact action: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_add_contact_links_shift_by_date() {
        let ctx = ctx();
        let shift = seed_shift(&ctx, json!({ "date": "2026-01-09", "cash_tips": 50 })).await;
        let out = run(
            &ctx,
            ActionName::AddEventContact,
            json!({ "name": "Dana", "role": "Wedding Planner", "shiftDate": "2026-01-09" }),
        )
        .await
        .unwrap();
        assert_eq!(
            out.message(),
            Some("✅ Saved Dana (wedding planner) to your shift on 2026-01-09.")
        );

        let listed = run(&ctx, ActionName::GetContactsForShift, json!({ "shiftId": id(&shift) }))
            .await
            .unwrap();
        let ActionOutcome::Completed { data, .. } = listed else {
            panic!("expected completion");
        };
        assert_eq!(data["count"], 1);
        assert_eq!(data["contacts"][0]["role"], "wedding_planner");
    }

    #[tokio::test]
    async fn test_add_contact_rejects_another_users_shift() {
        let ctx = ctx();
        let other = ExecContext::new(std::sync::Arc::clone(&ctx.store), "user-2", today());
        let foreign = seed_shift(&other, json!({ "date": "2026-01-09" })).await;

        let err = run(
            &ctx,
            ActionName::AddEventContact,
            json!({ "name": "Dana", "shiftId": id(&foreign) }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "not_found");
        let saved = ctx.select(&ctx.query(Table::Contacts)).await.unwrap();
        assert!(saved.is_empty());

        let mine = seed_shift(&ctx, json!({ "date": "2026-01-09" })).await;
        run(&ctx, ActionName::AddEventContact, json!({ "name": "Dana", "shiftId": id(&mine) }))
            .await
            .unwrap();
        let saved = ctx.select(&ctx.query(Table::Contacts)).await.unwrap();
        assert_eq!(text(&saved[0], "shift_id"), Some(id(&mine).as_str()));
    }

    #[tokio::test]
    async fn test_unknown_role_is_stored_as_custom() {
        let ctx = ctx();
        let out = run(
            &ctx,
            ActionName::AddEventContact,
            json!({ "name": "Sam", "role": "Balloon Artist" }),
        )
        .await
        .unwrap();
        let ActionOutcome::Completed { data, .. } = out else {
            panic!("expected completion");
        };
        assert_eq!(data["contact"]["role"], "custom");
        assert_eq!(data["contact"]["custom_role"], "Balloon Artist");
    }

    #[tokio::test]
    async fn test_add_contact_requires_name() {
        let ctx = ctx();
        let err = run(&ctx, ActionName::AddEventContact, json!({ "company": "Acme" }))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation_failed");
    }

    #[tokio::test]
    async fn test_search_and_favorite() {
        let ctx = ctx();
        run(&ctx, ActionName::AddEventContact, json!({ "name": "Dana Reyes", "company": "Bloom Florals" }))
            .await
            .unwrap();
        run(&ctx, ActionName::AddEventContact, json!({ "name": "Lee", "company": "Sound Co" }))
            .await
            .unwrap();

        let found = run(&ctx, ActionName::SearchContacts, json!({ "query": "bloom" }))
            .await
            .unwrap();
        assert_eq!(found.message(), Some("Found 1 contact."));

        run(&ctx, ActionName::SetContactFavorite, json!({ "name": "dana", "isFavorite": true }))
            .await
            .unwrap();
        let all = ctx.select(&ctx.query(Table::Contacts)).await.unwrap();
        let dana = all.iter().find(|c| text(c, "name") == Some("Dana Reyes")).unwrap();
        assert!(flag(dana, "is_favorite"));
    }

    #[tokio::test]
    async fn test_delete_contact_is_gated() {
        let ctx = ctx();
        run(&ctx, ActionName::AddEventContact, json!({ "name": "Lee" }))
            .await
            .unwrap();
        let out = run(&ctx, ActionName::DeleteEventContact, json!({ "name": "Lee" }))
            .await
            .unwrap();
        assert!(matches!(out, ActionOutcome::ConfirmationRequired { .. }));
        run(&ctx, ActionName::DeleteEventContact, json!({ "name": "Lee", "confirmed": true }))
            .await
            .unwrap();
        assert!(ctx.select(&ctx.query(Table::Contacts)).await.unwrap().is_empty());
    }
}
