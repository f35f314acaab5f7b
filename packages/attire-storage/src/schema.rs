/// Idempotent schema for the two document collections. Samples live inside
/// the item row as a JSONB array so the capped append can be guarded by
/// `jsonb_array_length` in a single statement.
pub const SCHEMA_SQL: &str = "\
CREATE TABLE IF NOT EXISTS clothing_items (
	item_id UUID PRIMARY KEY,
	garment_type TEXT NOT NULL,
	samples JSONB NOT NULL,
	created_at TIMESTAMPTZ NOT NULL,
	last_worn TIMESTAMPTZ,
	wear_count BIGINT NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_clothing_items_type ON clothing_items (garment_type, created_at);
CREATE TABLE IF NOT EXISTS wear_logs (
	log_id UUID PRIMARY KEY,
	item_id UUID NOT NULL,
	garment_type TEXT NOT NULL,
	worn_at TIMESTAMPTZ NOT NULL,
	confidence_score REAL NOT NULL,
	source_image_ref TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_wear_logs_item ON wear_logs (item_id);
CREATE INDEX IF NOT EXISTS idx_wear_logs_worn_at ON wear_logs (worn_at);
";
