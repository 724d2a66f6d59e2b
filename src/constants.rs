//! Workbook tab names and domain sentinels shared across jobs.

// Input tabs
pub const MASTER_REGISTRY_TAB: &str = "BASE DE DATOS";
pub const SALES_TAB: &str = "VENTAS_AFILIADOS";
pub const TRAINING_HISTORIC_TAB: &str = "CAPACITACIONES";
pub const TRAINING_INCREMENTAL_TAB: &str = "CAPACITACIONES_FINAL";
pub const SECTOR_TAB: &str = "SECTOR";

// Output tabs
pub const TRANSITION_DETAIL_TAB: &str = "CAMBIO_TAMANIO_EMPRESAS";
pub const TRANSITION_SUMMARY_TAB: &str = "RESUMEN_CAMBIOS_TAMANIO";
pub const TIER_SNAPSHOT_TAB: &str = "TAMANO_EMPRESA_GLOBAL";
pub const TRAINING_DASH_TAB: &str = "CAPACITACIONES_DASH_DATA";
pub const DASHBOARD_TAB: &str = "DASH_DATA";
pub const GENDER_SUMMARY_TAB: &str = "GERENTES_GENERO";

/// Placeholder row value marking a non-affiliated attendee; must never be
/// counted as a real member.
pub const NON_MEMBER_SENTINEL: &str = "NO SOCIOS";

/// Floor for the watch-mode re-run interval, so the backing sheet API is not
/// hammered by an overeager configuration.
pub const MIN_RUN_INTERVAL_SECS: u64 = 300;
