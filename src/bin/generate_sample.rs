use chrono::{Days, NaiveDate};

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

struct CountryProfile {
    name: &'static str,
    /// Rough population factor, scales the vaccination ramp.
    scale: f64,
    /// Case waves as (peak day, width, height).
    waves: &'static [(f64, f64, f64)],
    /// Day the vaccination campaign starts; earlier cells stay empty.
    vaccination_start: usize,
}

fn fmt_cell(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.0}")).unwrap_or_default()
}

fn main() {
    let mut rng = SimpleRng::new(42);

    let start_date = NaiveDate::from_ymd_opt(2020, 3, 1).expect("valid start date");
    let days: usize = 540;

    let countries = [
        CountryProfile {
            name: "Germany",
            scale: 1.0,
            waves: &[(60.0, 25.0, 5200.0), (230.0, 40.0, 14000.0), (420.0, 35.0, 9500.0)],
            vaccination_start: 300,
        },
        CountryProfile {
            name: "Japan",
            scale: 0.8,
            waves: &[(130.0, 30.0, 4000.0), (330.0, 45.0, 6500.0), (480.0, 30.0, 7800.0)],
            vaccination_start: 350,
        },
        CountryProfile {
            name: "Kenya",
            scale: 0.3,
            waves: &[(100.0, 35.0, 700.0), (250.0, 50.0, 1100.0), (460.0, 40.0, 1500.0)],
            vaccination_start: 380,
        },
        CountryProfile {
            name: "New Zealand",
            scale: 0.05,
            waves: &[(40.0, 15.0, 80.0), (500.0, 25.0, 180.0)],
            vaccination_start: 340,
        },
        CountryProfile {
            name: "Peru",
            scale: 0.5,
            waves: &[(90.0, 40.0, 4800.0), (300.0, 55.0, 7200.0)],
            vaccination_start: 330,
        },
    ];

    let path = "owid-covid-data.csv";
    let mut writer = csv::Writer::from_path(path).expect("create output file");
    writer
        .write_record([
            "location",
            "date",
            "total_cases",
            "new_cases",
            "total_deaths",
            "new_deaths",
            "total_vaccinations",
            "new_vaccinations",
        ])
        .expect("write header");

    let mut rows = 0usize;
    for profile in &countries {
        // Daily new cases from the wave mixture.
        let new_cases: Vec<f64> = (0..days)
            .map(|day| {
                let signal: f64 = profile
                    .waves
                    .iter()
                    .map(|&(peak, width, height)| gaussian(day as f64, peak, width, height))
                    .sum();
                (signal + rng.gauss(0.0, signal.max(8.0) * 0.06)).max(0.0).round()
            })
            .collect();

        // Deaths trail cases by two weeks.
        let new_deaths: Vec<f64> = (0..days)
            .map(|day| {
                let lagged = if day >= 14 { new_cases[day - 14] } else { 0.0 };
                (lagged * 0.018 + rng.gauss(0.0, 1.5)).max(0.0).round()
            })
            .collect();

        // Vaccinations ramp up once the campaign starts.
        let new_vaccinations: Vec<Option<f64>> = (0..days)
            .map(|day| {
                if day < profile.vaccination_start {
                    return None;
                }
                let t = (day - profile.vaccination_start) as f64;
                let ramp = 120_000.0 * profile.scale * (1.0 - (-t / 60.0).exp());
                Some((ramp + rng.gauss(0.0, ramp.max(500.0) * 0.05)).max(0.0).round())
            })
            .collect();

        let mut total_cases = 0.0;
        let mut total_deaths = 0.0;
        let mut total_vaccinations: Option<f64> = None;

        for day in 0..days {
            let date = start_date + Days::new(day as u64);

            // Reporting gaps: a few daily death figures go missing, while the
            // running totals stay continuous.
            let deaths_cell = if rng.next_f64() < 0.03 {
                None
            } else {
                Some(new_deaths[day])
            };

            total_cases += new_cases[day];
            total_deaths += new_deaths[day];
            if let Some(v) = new_vaccinations[day] {
                total_vaccinations = Some(total_vaccinations.unwrap_or(0.0) + v);
            }

            writer
                .write_record([
                    profile.name.to_string(),
                    date.to_string(),
                    fmt_cell(Some(total_cases)),
                    fmt_cell(Some(new_cases[day])),
                    fmt_cell(Some(total_deaths)),
                    fmt_cell(deaths_cell),
                    fmt_cell(total_vaccinations),
                    fmt_cell(new_vaccinations[day]),
                ])
                .expect("write row");
            rows += 1;
        }
    }

    writer.flush().expect("flush output");
    println!(
        "Wrote {rows} rows for {} countries to {path}",
        countries.len()
    );
}
