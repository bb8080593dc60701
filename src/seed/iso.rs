//! ISO 3166-1 alpha-3 to alpha-2 conversion for the bundled dataset.

const ISO3_TO_ISO2: &[(&str, &str)] = &[
    ("AFG", "AF"),
    ("ALB", "AL"),
    ("DZA", "DZ"),
    ("AND", "AD"),
    ("AGO", "AO"),
    ("ARG", "AR"),
    ("ARM", "AM"),
    ("AUS", "AU"),
    ("AUT", "AT"),
    ("AZE", "AZ"),
    ("BHS", "BS"),
    ("BHR", "BH"),
    ("BGD", "BD"),
    ("BRB", "BB"),
    ("BLR", "BY"),
    ("BEL", "BE"),
    ("BLZ", "BZ"),
    ("BEN", "BJ"),
    ("BTN", "BT"),
    ("BOL", "BO"),
    ("BIH", "BA"),
    ("BWA", "BW"),
    ("BRA", "BR"),
    ("BRN", "BN"),
    ("BGR", "BG"),
    ("BFA", "BF"),
    ("BDI", "BI"),
    ("KHM", "KH"),
    ("CMR", "CM"),
    ("CAN", "CA"),
    ("CPV", "CV"),
    ("CAF", "CF"),
    ("TCD", "TD"),
    ("CHL", "CL"),
    ("CHN", "CN"),
    ("COL", "CO"),
    ("COM", "KM"),
    ("COD", "CD"),
    ("COG", "CG"),
    ("CRI", "CR"),
    ("HRV", "HR"),
    ("CUB", "CU"),
    ("CYP", "CY"),
    ("CZE", "CZ"),
    ("DNK", "DK"),
    ("DJI", "DJ"),
    ("DMA", "DM"),
    ("DOM", "DO"),
    ("ECU", "EC"),
    ("EGY", "EG"),
    ("SLV", "SV"),
    ("GNQ", "GQ"),
    ("ERI", "ER"),
    ("EST", "EE"),
    ("SWZ", "SZ"),
    ("ETH", "ET"),
    ("FJI", "FJ"),
    ("FIN", "FI"),
    ("FRA", "FR"),
    ("GAB", "GA"),
    ("GMB", "GM"),
    ("GEO", "GE"),
    ("DEU", "DE"),
    ("GHA", "GH"),
    ("GRC", "GR"),
    ("GRD", "GD"),
    ("GTM", "GT"),
    ("GIN", "GN"),
    ("GNB", "GW"),
    ("GUY", "GY"),
    ("HTI", "HT"),
    ("HND", "HN"),
    ("HUN", "HU"),
    ("ISL", "IS"),
    ("IND", "IN"),
    ("IDN", "ID"),
    ("IRN", "IR"),
    ("IRQ", "IQ"),
    ("IRL", "IE"),
    ("ISR", "IL"),
    ("ITA", "IT"),
    ("JAM", "JM"),
    ("JPN", "JP"),
    ("JOR", "JO"),
    ("KAZ", "KZ"),
    ("KEN", "KE"),
    ("KIR", "KI"),
    ("KWT", "KW"),
    ("KGZ", "KG"),
    ("LAO", "LA"),
    ("LVA", "LV"),
    ("LBN", "LB"),
    ("LSO", "LS"),
    ("LBR", "LR"),
    ("LBY", "LY"),
    ("LIE", "LI"),
    ("LTU", "LT"),
    ("LUX", "LU"),
    ("MDG", "MG"),
    ("MWI", "MW"),
    ("MYS", "MY"),
    ("MDV", "MV"),
    ("MLI", "ML"),
    ("MLT", "MT"),
    ("MHL", "MH"),
    ("MRT", "MR"),
    ("MUS", "MU"),
    ("MEX", "MX"),
    ("FSM", "FM"),
    ("MDA", "MD"),
    ("MCO", "MC"),
    ("MNG", "MN"),
    ("MNE", "ME"),
    ("MAR", "MA"),
    ("MOZ", "MZ"),
    ("MMR", "MM"),
    ("NAM", "NA"),
    ("NRU", "NR"),
    ("NPL", "NP"),
    ("NLD", "NL"),
    ("NZL", "NZ"),
    ("NIC", "NI"),
    ("NER", "NE"),
    ("NGA", "NG"),
    ("PRK", "KP"),
    ("MKD", "MK"),
    ("NOR", "NO"),
    ("OMN", "OM"),
    ("PAK", "PK"),
    ("PLW", "PW"),
    ("PAN", "PA"),
    ("PNG", "PG"),
    ("PRY", "PY"),
    ("PER", "PE"),
    ("PHL", "PH"),
    ("POL", "PL"),
    ("PRT", "PT"),
    ("QAT", "QA"),
    ("ROU", "RO"),
    ("RUS", "RU"),
    ("RWA", "RW"),
    ("KNA", "KN"),
    ("LCA", "LC"),
    ("VCT", "VC"),
    ("WSM", "WS"),
    ("SMR", "SM"),
    ("STP", "ST"),
    ("SAU", "SA"),
    ("SEN", "SN"),
    ("SRB", "RS"),
    ("SYC", "SC"),
    ("SLE", "SL"),
    ("SGP", "SG"),
    ("SVK", "SK"),
    ("SVN", "SI"),
    ("SLB", "SB"),
    ("SOM", "SO"),
    ("ZAF", "ZA"),
    ("KOR", "KR"),
    ("SSD", "SS"),
    ("ESP", "ES"),
    ("LKA", "LK"),
    ("SDN", "SD"),
    ("SUR", "SR"),
    ("SWE", "SE"),
    ("CHE", "CH"),
    ("SYR", "SY"),
    ("TWN", "TW"),
    ("TJK", "TJ"),
    ("TZA", "TZ"),
    ("THA", "TH"),
    ("TLS", "TL"),
    ("TGO", "TG"),
    ("TON", "TO"),
    ("TTO", "TT"),
    ("TUN", "TN"),
    ("TUR", "TR"),
    ("TKM", "TM"),
    ("TUV", "TV"),
    ("UGA", "UG"),
    ("UKR", "UA"),
    ("ARE", "AE"),
    ("GBR", "GB"),
    ("USA", "US"),
    ("URY", "UY"),
    ("UZB", "UZ"),
    ("VUT", "VU"),
    ("VAT", "VA"),
    ("VEN", "VE"),
    ("VNM", "VN"),
    ("YEM", "YE"),
    ("ZMB", "ZM"),
    ("ZWE", "ZW"),
    ("PSE", "PS"),
];

/// Two-letter code for a three-letter one, if the table knows it.
pub fn iso3_to_iso2(iso3: &str) -> Option<&'static str> {
    let iso3 = iso3.to_ascii_uppercase();
    ISO3_TO_ISO2
        .iter()
        .find(|(three, _)| *three == iso3)
        .map(|(_, two)| *two)
}

/// Normalize a country code to the stored two-letter form. Codes missing
/// from the table are kept, upper-cased.
pub fn normalize_country_code(code: &str) -> String {
    match code.len() {
        3 => iso3_to_iso2(code)
            .map(str::to_string)
            .unwrap_or_else(|| code.to_ascii_uppercase()),
        _ => code.to_ascii_uppercase(),
    }
}
