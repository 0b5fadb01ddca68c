use shared_types::*;
use std::fs;
use std::path::Path;
use ts_rs::TS;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut types = Vec::new();

    // Category types
    types.push(clean_type(EntityType::export_to_string()?));
    types.push(clean_type(Category::export_to_string()?));
    types.push(clean_type(CreateCategoryRequest::export_to_string()?));
    types.push(clean_type(UpdateCategoryRequest::export_to_string()?));

    // Contact types
    types.push(clean_type(Contact::export_to_string()?));
    types.push(clean_type(CreateContactRequest::export_to_string()?));
    types.push(clean_type(UpdateContactRequest::export_to_string()?));
    types.push(clean_type(BulkAddContactsRequest::export_to_string()?));
    types.push(clean_type(BulkAddSummary::export_to_string()?));
    types.push(clean_type(BulkAddContactsData::export_to_string()?));

    // Import preview types
    types.push(clean_type(ImportStats::export_to_string()?));
    types.push(clean_type(ImportResult::export_to_string()?));
    types.push(clean_type(ImportPayload::export_to_string()?));
    types.push(clean_type(ImportPreview::export_to_string()?));
    types.push(clean_type(PreviewImportRequest::export_to_string()?));

    // WhatsApp settings types
    types.push(clean_type(SessionState::export_to_string()?));
    types.push(clean_type(WhatsAppStatus::export_to_string()?));

    types.push(clean_type(ApiErrorBody::export_to_string()?));

    let output_dir = Path::new("../client/src/api-types");
    fs::create_dir_all(output_dir)?;

    let output_path = output_dir.join("types.ts");
    let output = types.join("\n\n");

    fs::write(&output_path, output)?;
    println!("Generated TypeScript types in {}", output_path.display());

    Ok(())
}

fn clean_type(mut type_def: String) -> String {
    type_def.retain(|c| c != '\r');

    // Everything lands in one file, so cross-type imports are dropped
    let filtered: Vec<&str> = type_def
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.starts_with("import type")
                && !trimmed.starts_with("// This file was generated")
                && !trimmed.starts_with("/* This file was generated")
        })
        .collect();

    let result = filtered.join("\n").trim().to_string();
    if result.is_empty() {
        result
    } else {
        format!("{}\n", result)
    }
}
