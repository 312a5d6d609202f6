use crate::models::{Aggregation, DayCell};
use crate::render::{Renderer, Status};
use serde::Serialize;

/// Latest rendered state of one dashboard session, as served to the page.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardView {
    pub table: TableView,
    pub chart: ChartView,
    pub selector: Vec<DayCell>,
    pub status: Status,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableView {
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    pub date: String,
    pub cells: Vec<String>,
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChartView {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartSeries>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSeries {
    pub label: String,
    pub data: Vec<u64>,
    pub border_color: String,
    pub background_color: String,
}

const BRAND_PALETTE: &[(&str, &str, &str)] = &[
    ("M1", "#3b82f6", "rgba(59, 130, 246, 0.2)"),
    ("K1", "#10b981", "rgba(16, 185, 129, 0.2)"),
    ("B1", "#f59e0b", "rgba(245, 158, 11, 0.2)"),
    ("B2", "#8b5cf6", "rgba(139, 92, 246, 0.2)"),
    ("B3", "#ec4899", "rgba(236, 72, 153, 0.2)"),
    ("B4", "#06b6d4", "rgba(6, 182, 212, 0.2)"),
    ("M2", "#6366f1", "rgba(99, 102, 241, 0.2)"),
];

const FALLBACK_COLORS: &[&str] = &["#ef4444", "#f97316", "#84cc16", "#14b8a6"];

/// Border and fill colour for a brand's series.
pub fn brand_color(brand: &str, index: usize) -> (String, String) {
    if let Some((_, border, fill)) = BRAND_PALETTE.iter().find(|(name, _, _)| *name == brand) {
        return (border.to_string(), fill.to_string());
    }
    let color = FALLBACK_COLORS[index % FALLBACK_COLORS.len()];
    (color.to_string(), format!("{color}33"))
}

/// Newest day first, zero cells shown as `-`, one total per row.
pub fn build_table(view: &Aggregation) -> TableView {
    let rows = view
        .dates
        .iter()
        .rev()
        .map(|date| {
            let counts: Vec<u64> = view
                .brands
                .iter()
                .map(|brand| view.count(date, brand))
                .collect();
            TableRow {
                date: date.clone(),
                cells: counts
                    .iter()
                    .map(|count| if *count == 0 { "-".to_string() } else { count.to_string() })
                    .collect(),
                total: counts.iter().sum(),
            }
        })
        .collect();

    TableView {
        columns: view.brands.clone(),
        rows,
    }
}

pub fn build_chart(view: &Aggregation) -> ChartView {
    let datasets = view
        .brands
        .iter()
        .enumerate()
        .map(|(index, brand)| {
            let (border_color, background_color) = brand_color(brand, index);
            ChartSeries {
                label: brand.clone(),
                data: view.dates.iter().map(|date| view.count(date, brand)).collect(),
                border_color,
                background_color,
            }
        })
        .collect();

    ChartView {
        labels: view.dates.clone(),
        datasets,
    }
}

impl Renderer for DashboardView {
    fn render_table(&mut self, view: &Aggregation) {
        self.table = build_table(view);
    }

    fn render_chart(&mut self, view: &Aggregation) {
        self.chart = build_chart(view);
    }

    fn render_selector(&mut self, cells: &[DayCell]) {
        self.selector = cells.to_vec();
    }

    fn render_status(&mut self, status: &Status) {
        self.status = status.clone();
    }
}

pub fn render_index(view: &DashboardView) -> String {
    let state = serde_json::to_string(view)
        .unwrap_or_else(|_| "{}".to_string())
        .replace("</", "<\\/");
    INDEX_HTML.replace("{{STATE}}", &state)
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Brand Dashboard</title>
  <style>
    :root {
      --ink: #0f172a;
      --muted: #94a3b8;
      --accent: #4f46e5;
      --card: #ffffff;
    }

    body {
      margin: 0;
      background: #f1f5f9;
      color: var(--ink);
      font-family: "Inter", "Trebuchet MS", sans-serif;
      padding: 32px 18px;
    }

    .app {
      max-width: 1000px;
      margin: 0 auto;
      display: grid;
      gap: 24px;
    }

    .card {
      background: var(--card);
      border-radius: 16px;
      padding: 24px;
      box-shadow: 0 10px 30px rgba(15, 23, 42, 0.08);
    }

    .status { color: var(--muted); font-size: 0.9rem; }
    .status.error { color: #ef4444; }

    .calendar {
      display: grid;
      grid-template-columns: repeat(7, 1fr);
      gap: 6px;
      user-select: none;
    }

    .day {
      padding: 10px 0;
      text-align: center;
      border-radius: 10px;
      background: #f8fafc;
      font-size: 0.85rem;
    }

    .day.enabled { cursor: pointer; }
    .day.enabled:hover { outline: 2px solid #c7d2fe; }
    .day.selected { background: var(--accent); color: white; }
    .day.disabled { color: #cbd5e1; pointer-events: none; }

    table { width: 100%; border-collapse: collapse; }
    th, td { padding: 10px 14px; text-align: center; }
    th:first-child, td:first-child { text-align: left; }
    td.zero { color: #cbd5e1; }
    td.total { text-align: right; font-weight: 700; color: var(--accent); }
    .empty { color: var(--muted); text-align: center; padding: 24px; }
  </style>
</head>
<body>
  <main class="app">
    <section class="card">
      <h1>Daily brand counts</h1>
      <p class="status" id="status"></p>
      <div class="calendar" id="calendar"></div>
    </section>
    <section class="card"><svg id="chart" viewBox="0 0 600 260" width="100%"></svg></section>
    <section class="card"><div id="table"></div></section>
  </main>
  <script>
    let view = {{STATE}};

    // requests go out one at a time so the server sees events in dispatch order
    let queue = Promise.resolve();
    const send = async (path, body) => {
      const response = await fetch(path, {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify(body || {})
      });
      if (response.ok) {
        view = await response.json();
        render();
      }
    };
    const post = (path, body) => {
      queue = queue.then(() => send(path, body)).catch(() => {});
      return queue;
    };

    document.addEventListener('pointerup', () => post('/api/selector/pointer', { kind: 'up' }));

    const renderCalendar = () => {
      const calendar = document.getElementById('calendar');
      calendar.innerHTML = '';
      view.selector.forEach((cell) => {
        const el = document.createElement('div');
        el.textContent = cell.key.slice(8);
        el.title = cell.key;
        el.className = 'day ' + (cell.enabled ? 'enabled' : 'disabled') + (cell.selected ? ' selected' : '');
        if (cell.enabled) {
          el.addEventListener('pointerdown', (event) => {
            event.preventDefault();
            post('/api/selector/pointer', { kind: 'down', date: cell.key });
          });
          el.addEventListener('pointerenter', (event) => {
            if (event.buttons & 1) {
              post('/api/selector/pointer', { kind: 'enter', date: cell.key });
            }
          });
        }
        calendar.appendChild(el);
      });
    };

    const renderTable = () => {
      const host = document.getElementById('table');
      if (!view.table.rows.length) {
        host.innerHTML = '<p class="empty">No dates selected</p>';
        return;
      }
      const table = document.createElement('table');
      const head = table.createTHead().insertRow();
      ['Date', ...view.table.columns, 'Total'].forEach((name) => {
        const th = document.createElement('th');
        th.textContent = name;
        head.appendChild(th);
      });
      const body = table.createTBody();
      view.table.rows.forEach((row) => {
        const tr = body.insertRow();
        tr.insertCell().textContent = row.date;
        row.cells.forEach((value) => {
          const td = tr.insertCell();
          td.textContent = value;
          if (value === '-') td.className = 'zero';
        });
        const total = tr.insertCell();
        total.className = 'total';
        total.textContent = row.total;
      });
      host.replaceChildren(table);
    };

    const renderChart = () => {
      const svg = document.getElementById('chart');
      const { labels, datasets } = view.chart;
      if (!labels.length) {
        svg.innerHTML = '';
        return;
      }
      const max = Math.max(1, ...datasets.flatMap((series) => series.data));
      const step = labels.length > 1 ? 520 / (labels.length - 1) : 0;
      const x = (index) => 40 + index * step;
      const y = (value) => 230 - (value / max) * 200;
      svg.innerHTML = datasets
        .map((series) => {
          const points = series.data.map((value, index) => `${x(index)},${y(value)}`).join(' ');
          return `<polyline fill="none" stroke="${series.border_color}" stroke-width="2" points="${points}" />`;
        })
        .join('');
    };

    const renderStatus = () => {
      const el = document.getElementById('status');
      const { error, empty_selection, last_updated } = view.status;
      el.className = 'status' + (error ? ' error' : '');
      el.textContent = error || (empty_selection ? 'No dates selected' : (last_updated ? `Updated ${last_updated}` : ''));
    };

    const render = () => {
      renderCalendar();
      renderTable();
      renderChart();
      renderStatus();
    };

    render();
  </script>
</body>
</html>
"#;
