// src/common/tempo.rs

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};

// "Hoje" e os filtros por data seguem o fuso do servidor. O Postgres só recebe
// instantes em UTC, nunca um `::date` calculado no fuso da sessão.

pub fn hoje() -> NaiveDate {
    Local::now().date_naive()
}

/// Instante (UTC) em que o dia começa no fuso `tz`.
pub fn inicio_do_dia_em<Tz: TimeZone>(tz: &Tz, dia: NaiveDate) -> DateTime<Utc> {
    let meia_noite = dia.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&meia_noite)
        .earliest()
        // Horário de verão começando à meia-noite: o dia começa à 01:00
        .or_else(|| tz.from_local_datetime(&(meia_noite + Duration::hours(1))).earliest())
        .map(|inicio| inicio.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&meia_noite))
}

/// Intervalo semiaberto [início, fim) do dia no fuso `tz`.
pub fn limites_do_dia_em<Tz: TimeZone>(tz: &Tz, dia: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let seguinte = dia.succ_opt().unwrap_or(dia);
    (inicio_do_dia_em(tz, dia), inicio_do_dia_em(tz, seguinte))
}

pub fn limites_do_dia(dia: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    limites_do_dia_em(&Local, dia)
}

/// Converte `desde`/`ate` (inclusivos, no fuso do servidor) em `criado_em >= $1 AND criado_em < $2`.
pub fn limites_do_periodo(
    desde: Option<NaiveDate>,
    ate: Option<NaiveDate>,
) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    (
        desde.map(|d| inicio_do_dia_em(&Local, d)),
        ate.map(|a| limites_do_dia(a).1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn data(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn utc(texto: &str) -> DateTime<Utc> {
        texto.parse().unwrap()
    }

    #[test]
    fn day_bounds_follow_the_server_zone_not_utc() {
        // UTC-12: 11:28 UTC do dia 16 ainda é dia 15 no fuso local
        let fuso = FixedOffset::west_opt(12 * 3600).unwrap();
        let agora = utc("2026-10-16T11:28:00Z");
        let dia_local = agora.with_timezone(&fuso).date_naive();
        assert_eq!(dia_local, data(2026, 10, 15));

        let (inicio, fim) = limites_do_dia_em(&fuso, dia_local);
        assert_eq!(inicio, utc("2026-10-15T12:00:00Z"));
        assert_eq!(fim, utc("2026-10-16T12:00:00Z"));
        assert!(inicio <= agora && agora < fim);
    }

    #[test]
    fn brazil_day_starts_at_three_utc() {
        let fuso = FixedOffset::west_opt(3 * 3600).unwrap();
        let (inicio, fim) = limites_do_dia_em(&fuso, data(2025, 3, 1));
        assert_eq!(inicio, utc("2025-03-01T03:00:00Z"));
        assert_eq!(fim - inicio, Duration::days(1));
    }

    #[test]
    fn period_end_is_exclusive_start_of_next_day() {
        let (desde, ate) = limites_do_periodo(Some(data(2025, 3, 1)), Some(data(2025, 3, 1)));
        let (desde, ate) = (desde.unwrap(), ate.unwrap());
        assert_eq!(desde, inicio_do_dia_em(&Local, data(2025, 3, 1)));
        assert_eq!(ate, inicio_do_dia_em(&Local, data(2025, 3, 2)));
        assert_eq!(limites_do_periodo(None, None), (None, None));
    }
}
